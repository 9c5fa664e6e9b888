pub mod backend_trait;
pub mod factory;
pub mod fasttext;
pub mod mock;

pub use backend_trait::SupervisedBackend;
pub use factory::build_backend;
pub use fasttext::FasttextBackend;
pub use mock::MockBackend;
