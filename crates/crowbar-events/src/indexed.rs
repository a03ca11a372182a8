use crate::dispatcher::{EventDispatcher, HandlerId, HandlerPriority};

/// 256 handler lists addressed by a one-byte index. Used to fan out
/// per-message-ID subscribers without a hash lookup.
pub struct IndexedEventDispatcher<H> {
    slots: Vec<EventDispatcher<H>>,
}

impl<H> IndexedEventDispatcher<H> {
    pub fn new() -> Self {
        Self {
            slots: (0..=u8::MAX as usize).map(|_| EventDispatcher::new()).collect(),
        }
    }

    pub fn register(&mut self, index: u8, priority: HandlerPriority, handler: H) -> HandlerId {
        self.slots[index as usize].register(priority, handler)
    }

    pub fn register_once(
        &mut self,
        index: u8,
        priority: HandlerPriority,
        handler: H,
    ) -> HandlerId {
        self.slots[index as usize].register_once(priority, handler)
    }

    pub fn remove(&mut self, index: u8, id: HandlerId) -> bool {
        self.slots[index as usize].remove(id)
    }

    pub fn has_handlers(&self, index: u8) -> bool {
        !self.slots[index as usize].is_empty()
    }

    pub fn at(&self, index: u8) -> &EventDispatcher<H> {
        &self.slots[index as usize]
    }

    pub fn at_mut(&mut self, index: u8) -> &mut EventDispatcher<H> {
        &mut self.slots[index as usize]
    }

    pub fn dispatch(&mut self, index: u8, invoke: impl FnMut(&mut H)) {
        self.slots[index as usize].dispatch(invoke);
    }

    pub fn dispatch_stop_at_false(
        &mut self,
        index: u8,
        invoke: impl FnMut(&mut H) -> bool,
    ) -> bool {
        self.slots[index as usize].dispatch_stop_at_false(invoke)
    }
}

impl<H> Default for IndexedEventDispatcher<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_are_isolated() {
        let mut d: IndexedEventDispatcher<u32> = IndexedEventDispatcher::new();
        d.register(7, HandlerPriority::Default, 0);
        d.register(200, HandlerPriority::Default, 0);

        d.dispatch(7, |calls| *calls += 1);

        let mut at7 = 0;
        let mut at200 = 0;
        d.dispatch(7, |calls| at7 = *calls);
        d.dispatch(200, |calls| at200 = *calls);
        assert_eq!(at7, 1);
        assert_eq!(at200, 0);
    }

    #[test]
    fn test_has_handlers() {
        let mut d: IndexedEventDispatcher<u32> = IndexedEventDispatcher::new();
        assert!(!d.has_handlers(5));
        let id = d.register(5, HandlerPriority::Default, 0);
        assert!(d.has_handlers(5));
        d.remove(5, id);
        assert!(!d.has_handlers(5));
    }
}
