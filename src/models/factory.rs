use crate::config::BackendKind;
use crate::models::backend_trait::SupervisedBackend;

/// Build a boxed backend from a `BackendKind`.
/// Currently this is a thin factory implemented as a single function.
pub fn build_backend(kind: &BackendKind) -> Box<dyn SupervisedBackend> {
    match kind {
        BackendKind::Mock => {
            log::debug!("Building mock backend");
            Box::new(crate::models::mock::MockBackend::new())
        }

        #[cfg(feature = "fasttext")]
        BackendKind::FastText => {
            log::debug!("Building fastText backend");
            Box::new(crate::models::fasttext::FasttextBackend::new())
        } // When compiled, `BackendKind` only contains the variants enabled by
          // features. The above arms are exhaustive for the compiled enum, so
          // no catch-all arm is necessary.
    }
}
