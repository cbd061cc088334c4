use std::rc::Rc;

use langpref_types::LocaleCode;

use crate::ports::{ListenerId, ScheduledTask};

/// Identifier returned by [`super::LocaleSubscriber::on_change`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(pub(crate) u64);

pub(super) type Handler = Rc<dyn Fn(&LocaleCode)>;

#[derive(Default)]
pub(super) struct SubscriberState {
    /// Last locale this consumer observed or was told about
    pub baseline: Option<LocaleCode>,
    pub handlers: Vec<(HandlerId, Handler)>,
    pub next_handler: u64,
    pub bus_listener: Option<ListenerId>,
    pub poll_task: Option<Box<dyn ScheduledTask>>,
    pub stopped: bool,
}

impl SubscriberState {
    pub fn with_baseline(baseline: Option<LocaleCode>) -> Self {
        Self { baseline, ..Self::default() }
    }

    pub fn add_handler(&mut self, handler: Handler) -> HandlerId {
        let id = HandlerId(self.next_handler);
        self.next_handler += 1;
        self.handlers.push((id, handler));
        id
    }

    /// Move the baseline; `false` when `locale` is already current.
    pub fn advance(&mut self, locale: &LocaleCode) -> bool {
        if self.baseline.as_ref() == Some(locale) {
            return false;
        }
        self.baseline = Some(locale.clone());
        true
    }

    pub fn snapshot(&self) -> Vec<Handler> {
        self.handlers.iter().map(|(_, h)| Rc::clone(h)).collect()
    }
}
