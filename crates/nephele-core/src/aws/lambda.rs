use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_lambda::Client;
use aws_sdk_lambda::types::{FunctionConfiguration, InvocationType};

use super::sdk_error;
use crate::error::{Result, Service};
use crate::functions::{FunctionPage, FunctionSummary, FunctionsApi, InvocationResult};

/// [`FunctionsApi`] over the Lambda SDK client
#[derive(Debug, Clone)]
pub struct LambdaBackend {
    client: Client,
}

impl LambdaBackend {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl FunctionsApi for LambdaBackend {
    async fn list_functions(&self, marker: Option<String>) -> Result<FunctionPage> {
        let output = self
            .client
            .list_functions()
            .set_marker(marker)
            .send()
            .await
            .map_err(|e| sdk_error(Service::Lambda, e))?;

        Ok(FunctionPage {
            functions: output.functions().iter().map(summarize).collect(),
            next_marker: output.next_marker().map(str::to_string),
        })
    }

    async fn invoke(&self, name: &str) -> Result<InvocationResult> {
        let output = self
            .client
            .invoke()
            .function_name(name)
            .invocation_type(InvocationType::RequestResponse)
            .send()
            .await
            .map_err(|e| sdk_error(Service::Lambda, e))?;

        Ok(InvocationResult {
            function_name: name.to_string(),
            status_code: output.status_code(),
            function_error: output.function_error().map(str::to_string),
            executed_version: output.executed_version().map(str::to_string),
            payload: output
                .payload()
                .map(|blob| String::from_utf8_lossy(blob.as_ref()).into_owned())
                .unwrap_or_default(),
        })
    }
}

fn summarize(function: &FunctionConfiguration) -> FunctionSummary {
    FunctionSummary {
        name: function.function_name().unwrap_or_default().to_string(),
        description: function
            .description()
            .filter(|d| !d.is_empty())
            .map(str::to_string),
        runtime: function.runtime().map(|r| r.as_str().to_string()),
        memory_size: function.memory_size(),
        timeout: function.timeout(),
        handler: function.handler().map(str::to_string),
        role: function.role().map(str::to_string),
        version: function.version().map(str::to_string),
    }
}
