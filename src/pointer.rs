//! Pointer input for the cloth's pinned row.
//!
//! On the web a `mousemove` listener on the page window broadcasts samples
//! over a [`bus::Bus`]; the frame loop drains it and applies the latest one.

use bus::{Bus, BusReader};
use three_d::*;

/// Pointer offset from the viewport center, as a fraction of the viewport
/// size. `y` points up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub x: f32,
    pub y: f32,
}

impl PointerSample {
    /// From client coordinates with the origin at the top-left corner.
    pub fn from_client(client_x: f64, client_y: f64, width: f64, height: f64) -> Self {
        let x = (client_x - width / 2.0) / width;
        let y = -(client_y - height / 2.0) / height;
        Self {
            x: x as f32,
            y: y as f32,
        }
    }

    /// From window coordinates with the origin at the bottom-left corner.
    pub fn from_bottom_left(x: f32, y: f32, viewport: Viewport) -> Self {
        let width = viewport.width as f64;
        let height = viewport.height as f64;
        Self::from_client(x as f64, height - y as f64, width, height)
    }

    /// Anchor point for the pinned row.
    pub fn target(&self, scale: f32) -> Vec3 {
        vec3(self.x * scale, self.y * scale, 0.0)
    }
}

/// Picks the newest mouse position out of a frame's window events.
pub fn latest_from_events(events: &[Event], viewport: Viewport) -> Option<PointerSample> {
    events.iter().rev().find_map(|event| match event {
        Event::MouseMotion { position, .. } => {
            Some(PointerSample::from_bottom_left(position.x, position.y, viewport))
        }
        _ => None,
    })
}

/// Bounded queue of samples between the event callback and the frame loop.
///
/// A sample that does not fit in the bus is parked in `overflow`, which only
/// ever holds the newest rejected sample, so `latest` never loses the most
/// recent pointer position.
pub struct SampleFeed {
    bus: Bus<PointerSample>,
    rx: BusReader<PointerSample>,
    overflow: Option<PointerSample>,
}

impl SampleFeed {
    pub fn new(capacity: usize) -> Self {
        let mut bus = Bus::new(capacity);
        let rx = bus.add_rx();
        Self {
            bus,
            rx,
            overflow: None,
        }
    }

    pub fn push(&mut self, sample: PointerSample) {
        if let Err(sample) = self.bus.try_broadcast(sample) {
            self.overflow = Some(sample);
        }
    }

    /// Drains pending samples and returns the newest.
    pub fn latest(&mut self) -> Option<PointerSample> {
        let mut latest = None;
        while let Ok(sample) = self.rx.try_recv() {
            latest = Some(sample);
        }
        self.overflow.take().or(latest)
    }
}

#[cfg(target_arch = "wasm32")]
pub use listener::PointerListener;

#[cfg(target_arch = "wasm32")]
mod listener {
    use std::{cell::RefCell, rc::Rc};

    use wasm_bindgen::prelude::*;
    use web_sys::MouseEvent;

    use super::{PointerSample, SampleFeed};
    use crate::error::DemoError;
    use crate::log;

    const BUS_CAPACITY: usize = 64;

    pub struct PointerListener {
        feed: Rc<RefCell<SampleFeed>>,
        callback: Closure<dyn FnMut(MouseEvent) + 'static>,
    }

    impl PointerListener {
        pub fn attach() -> Result<Self, DemoError> {
            let window = web_sys::window().ok_or_else(|| DemoError::Dom("no global window".to_string()))?;

            let feed = Rc::new(RefCell::new(SampleFeed::new(BUS_CAPACITY)));
            let sender = feed.clone();

            let window_size = window.clone();
            let callback = Closure::wrap(Box::new(move |event: MouseEvent| {
                let width = window_size
                    .inner_width()
                    .ok()
                    .and_then(|w| w.as_f64())
                    .unwrap_or(1.0);
                let height = window_size
                    .inner_height()
                    .ok()
                    .and_then(|h| h.as_f64())
                    .unwrap_or(1.0);
                let sample = PointerSample::from_client(
                    event.client_x() as f64,
                    event.client_y() as f64,
                    width,
                    height,
                );
                sender.borrow_mut().push(sample);
            }) as Box<dyn FnMut(_)>);

            window
                .add_event_listener_with_callback("mousemove", callback.as_ref().unchecked_ref())
                .map_err(|e| DemoError::Dom(crate::utils::js_error_string(&e)))?;
            log!("PointerListener::attach(): listening for mousemove");

            Ok(Self { feed, callback })
        }

        pub fn latest(&mut self) -> Option<PointerSample> {
            self.feed.borrow_mut().latest()
        }
    }

    impl Drop for PointerListener {
        fn drop(&mut self) {
            if let Some(window) = web_sys::window() {
                let _ = window.remove_event_listener_with_callback(
                    "mousemove",
                    self.callback.as_ref().unchecked_ref(),
                );
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_maps_to_origin() {
        let sample = PointerSample::from_client(400.0, 300.0, 800.0, 600.0);
        assert_eq!(sample, PointerSample { x: 0.0, y: 0.0 });
    }

    #[test]
    fn top_left_maps_to_negative_x_positive_y() {
        let sample = PointerSample::from_client(0.0, 0.0, 800.0, 600.0);
        assert_eq!(sample, PointerSample { x: -0.5, y: 0.5 });
        assert_eq!(sample.target(6.0), vec3(-3.0, 3.0, 0.0));
    }

    #[test]
    fn bottom_left_origin_flips_y() {
        let viewport = Viewport::new_at_origo(800, 600);
        let sample = PointerSample::from_bottom_left(800.0, 0.0, viewport);
        assert_eq!(sample, PointerSample { x: 0.5, y: -0.5 });
    }

    #[test]
    fn full_feed_keeps_the_newest_sample() {
        let mut feed = SampleFeed::new(2);
        for i in 0..10 {
            feed.push(PointerSample { x: i as f32, y: 0.0 });
        }
        assert_eq!(feed.latest(), Some(PointerSample { x: 9.0, y: 0.0 }));
        assert_eq!(feed.latest(), None);

        feed.push(PointerSample { x: 1.0, y: 1.0 });
        assert_eq!(feed.latest(), Some(PointerSample { x: 1.0, y: 1.0 }));
    }

    #[test]
    fn no_motion_events_means_no_sample() {
        let viewport = Viewport::new_at_origo(800, 600);
        assert_eq!(latest_from_events(&[], viewport), None);
    }
}
