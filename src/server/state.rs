use std::sync::Arc;
use std::time::Instant;

use crate::config::Settings;
use crate::push::PushSender;
use crate::relay::{RelayDispatcher, RelayService};
use crate::store::RecordStore;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub relay: Arc<RelayService>,
    pub start_time: Instant,
}

impl AppState {
    /// Wire the relay from an already-selected store and sender.
    pub fn new(
        settings: Settings,
        store: Arc<dyn RecordStore>,
        sender: Arc<dyn PushSender>,
    ) -> Self {
        let dispatcher = Arc::new(RelayDispatcher::new(
            store,
            sender,
            settings.relay.default_title.clone(),
        ));
        let relay = Arc::new(RelayService::new(
            dispatcher,
            settings.relay.collection.clone(),
        ));

        Self {
            settings: Arc::new(settings),
            relay,
            start_time: Instant::now(),
        }
    }
}
