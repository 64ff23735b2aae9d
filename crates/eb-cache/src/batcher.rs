use eb_engine::Batcher;
use eb_types::Invalidator;

/// Delivers cache callbacks inside an [`Invalidator::batch`].
///
/// Callbacks that invalidate the same invalidator during delivery collapse
/// into one revision bump, as do deliveries nested inside a batch the caller
/// already has open.
#[derive(Clone, Debug)]
pub struct InvalidatorBatcher {
    invalidator: Invalidator,
}

impl InvalidatorBatcher {
    pub fn new(invalidator: Invalidator) -> Self {
        Self { invalidator }
    }
}

impl Batcher for InvalidatorBatcher {
    fn batch(&self, deliver: &mut dyn FnMut()) {
        self.invalidator.batch(|| deliver());
    }
}
