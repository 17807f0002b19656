use std::sync::Arc;

use pressroom_shared::BlogStore;

use crate::media::MediaStorage;

#[derive(Clone)]
pub struct AppState {
    pub store: BlogStore,
    /// Thumbnail backend; local disk in production, swappable in tests.
    pub media: Arc<dyn MediaStorage>,
}

impl AppState {
    pub fn new(store: BlogStore, media: Arc<dyn MediaStorage>) -> Self {
        Self { store, media }
    }
}
