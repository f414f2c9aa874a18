use heapless::Vec;

use crate::types::{ChannelId, Message};

/// Capability implemented by everything that can consume routed messages.
///
/// Handlers are only ever invoked from the single consumer task, one message
/// at a time, so implementations need no internal locking.
#[allow(async_fn_in_trait)]
pub trait MessageHandler {
    async fn handle_message(&mut self, msg: Message);
}

/// The route table is out of slots.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RouterFull;

/// Static mapping from channel identifier to a handler tag.
///
/// The tag type is chosen by the composition root, which owns the handlers
/// themselves; the router only answers "who consumes this channel". Messages
/// on channels with no route are the caller's to log and drop.
pub struct Router<H: Copy + PartialEq, const N: usize> {
    routes: Vec<(ChannelId, H), N>,
}

impl<H: Copy + PartialEq, const N: usize> Router<H, N> {
    pub const fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Registers a handler for a channel. Registering the same channel twice
    /// replaces the previous route.
    pub fn register(&mut self, channel: ChannelId, handler: H) -> Result<(), RouterFull> {
        if let Some(route) = self.routes.iter_mut().find(|(ch, _)| *ch == channel) {
            route.1 = handler;
            return Ok(());
        }
        self.routes.push((channel, handler)).map_err(|_| RouterFull)
    }

    pub fn lookup(&self, channel: ChannelId) -> Option<H> {
        self.routes
            .iter()
            .find(|(ch, _)| *ch == channel)
            .map(|(_, handler)| *handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChannelId, MOTION_CONTROL, OTA_CONTROL, OTA_DATA};

    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    enum Slot {
        Update,
        Motion,
    }

    #[test]
    fn routes_registered_channels() {
        let mut router: Router<Slot, 4> = Router::new();
        router.register(OTA_CONTROL, Slot::Update).unwrap();
        router.register(OTA_DATA, Slot::Update).unwrap();
        router.register(MOTION_CONTROL, Slot::Motion).unwrap();

        assert_eq!(router.lookup(OTA_CONTROL), Some(Slot::Update));
        assert_eq!(router.lookup(OTA_DATA), Some(Slot::Update));
        assert_eq!(router.lookup(MOTION_CONTROL), Some(Slot::Motion));
    }

    #[test]
    fn unregistered_channel_has_no_route() {
        let mut router: Router<Slot, 4> = Router::new();
        router.register(OTA_CONTROL, Slot::Update).unwrap();

        assert_eq!(router.lookup(ChannelId(0xdead_beef)), None);
    }

    #[test]
    fn reregistration_replaces_the_route() {
        let mut router: Router<Slot, 4> = Router::new();
        router.register(OTA_CONTROL, Slot::Update).unwrap();
        router.register(OTA_CONTROL, Slot::Motion).unwrap();

        assert_eq!(router.lookup(OTA_CONTROL), Some(Slot::Motion));
    }

    #[test]
    fn full_table_rejects_new_routes() {
        let mut router: Router<Slot, 1> = Router::new();
        router.register(OTA_CONTROL, Slot::Update).unwrap();

        assert_eq!(router.register(OTA_DATA, Slot::Update), Err(RouterFull));
        // Replacing an existing route still works at capacity.
        assert!(router.register(OTA_CONTROL, Slot::Motion).is_ok());
    }
}
