use crate::exception::Exception;
use async_trait::async_trait;

pub mod builtins;

/// Pipes fail with an [`Exception`] the filter knows how to translate.
pub type PipeResult<T> = Result<T, Exception>;

/// The Pipe trait for transformation and validation
#[async_trait]
pub trait Pipe: Send + Sync + 'static {
    type Input: Send + 'static;
    type Output: Send + 'static;

    async fn transform(&self, input: Self::Input) -> PipeResult<Self::Output>;
}
