use super::{
    GenerationRequest, ModelClient, ModelResponse, OperationHandle, OperationStatus,
    ProviderError,
};

/// Stand-in used when no API key is configured. Startup succeeds; every
/// generation fails with [`ProviderError::Unavailable`].
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableClient;

#[async_trait::async_trait]
impl ModelClient for UnavailableClient {
    fn is_available(&self) -> bool {
        false
    }

    async fn generate(&self, _request: GenerationRequest) -> Result<ModelResponse, ProviderError> {
        Err(ProviderError::Unavailable)
    }

    async fn start_operation(
        &self,
        _request: GenerationRequest,
    ) -> Result<OperationHandle, ProviderError> {
        Err(ProviderError::Unavailable)
    }

    async fn check_operation(
        &self,
        _handle: &OperationHandle,
    ) -> Result<OperationStatus, ProviderError> {
        Err(ProviderError::Unavailable)
    }
}
