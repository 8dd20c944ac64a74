//! Lambda function operations

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{CoreError, Result, Service};

/// Invocation type used for every invoke: wait for the function's response
pub const INVOCATION_TYPE: &str = "RequestResponse";

/// Stop following markers after this many pages
const MAX_PAGES: usize = 1000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FunctionSummary {
    pub name: String,
    pub description: Option<String>,
    pub runtime: Option<String>,
    /// Memory in MB
    pub memory_size: Option<i32>,
    /// Timeout in seconds
    pub timeout: Option<i32>,
    pub handler: Option<String>,
    pub role: Option<String>,
    pub version: Option<String>,
}

/// One page of `ListFunctions`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionPage {
    pub functions: Vec<FunctionSummary>,
    pub next_marker: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationResult {
    pub function_name: String,
    pub status_code: i32,
    /// Set when the function itself raised an error
    pub function_error: Option<String>,
    pub executed_version: Option<String>,
    pub payload: String,
}

impl InvocationResult {
    pub fn is_error(&self) -> bool {
        self.function_error.is_some()
    }
}

#[async_trait]
pub trait FunctionsApi: Send + Sync {
    /// Fetch one page, starting at `marker`
    async fn list_functions(&self, marker: Option<String>) -> Result<FunctionPage>;

    /// Synchronously invoke `name` with an empty payload
    async fn invoke(&self, name: &str) -> Result<InvocationResult>;
}

pub struct FunctionsService<F> {
    api: F,
}

impl<F: FunctionsApi> FunctionsService<F> {
    pub fn new(api: F) -> Self {
        Self { api }
    }

    /// List every function in the region
    pub async fn list_functions(&self) -> Result<Vec<FunctionSummary>> {
        let mut functions = Vec::new();
        let mut marker = None;

        for page_number in 1..=MAX_PAGES {
            let page = self.api.list_functions(marker).await?;
            debug!(
                "Lambda page {}: {} function(s)",
                page_number,
                page.functions.len()
            );
            functions.extend(page.functions);

            match page.next_marker {
                Some(next) if !next.is_empty() => marker = Some(next),
                _ => return Ok(functions),
            }
        }

        Err(CoreError::api(
            Service::Lambda,
            None,
            format!("listing did not finish after {} pages", MAX_PAGES),
        ))
    }

    pub async fn invoke_function(&self, name: &str) -> Result<InvocationResult> {
        if name.trim().is_empty() {
            return Err(CoreError::Validation(
                "function name must not be empty".to_string(),
            ));
        }

        info!("Invoking {} ({})", name, INVOCATION_TYPE);
        let result = self.api.invoke(name).await?;
        debug!(
            "Invocation of {} returned status {}",
            name, result.status_code
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn function(name: &str) -> FunctionSummary {
        FunctionSummary {
            name: name.to_string(),
            runtime: Some("python3.12".to_string()),
            memory_size: Some(128),
            timeout: Some(3),
            ..Default::default()
        }
    }

    /// Pages keyed by the marker that requests them
    struct PagedLambda {
        pages: HashMap<Option<String>, FunctionPage>,
        requested: Mutex<Vec<Option<String>>>,
    }

    #[async_trait]
    impl FunctionsApi for PagedLambda {
        async fn list_functions(&self, marker: Option<String>) -> Result<FunctionPage> {
            self.requested.lock().unwrap().push(marker.clone());
            Ok(self.pages.get(&marker).cloned().unwrap_or_default())
        }

        async fn invoke(&self, name: &str) -> Result<InvocationResult> {
            Ok(InvocationResult {
                function_name: name.to_string(),
                status_code: 200,
                function_error: (name == "broken").then(|| "Unhandled".to_string()),
                executed_version: Some("$LATEST".to_string()),
                payload: r#"{"ok":true}"#.to_string(),
            })
        }
    }

    fn paged(pages: Vec<(Option<&str>, FunctionPage)>) -> PagedLambda {
        PagedLambda {
            pages: pages
                .into_iter()
                .map(|(marker, page)| (marker.map(str::to_string), page))
                .collect(),
            requested: Mutex::new(Vec::new()),
        }
    }

    #[tokio::test]
    async fn test_list_follows_markers() {
        let service = FunctionsService::new(paged(vec![
            (
                None,
                FunctionPage {
                    functions: vec![function("a"), function("b")],
                    next_marker: Some("m1".to_string()),
                },
            ),
            (
                Some("m1"),
                FunctionPage {
                    functions: vec![function("c")],
                    next_marker: None,
                },
            ),
        ]));

        let functions = service.list_functions().await.unwrap();
        let names: Vec<_> = functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(
            *service.api.requested.lock().unwrap(),
            vec![None, Some("m1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_list_stops_on_empty_marker() {
        let service = FunctionsService::new(paged(vec![(
            None,
            FunctionPage {
                functions: vec![function("only")],
                next_marker: Some(String::new()),
            },
        )]));

        assert_eq!(service.list_functions().await.unwrap().len(), 1);
        assert_eq!(service.api.requested.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_empty_region() {
        let service = FunctionsService::new(paged(vec![]));
        assert!(service.list_functions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invoke() {
        let service = FunctionsService::new(paged(vec![]));

        let ok = service.invoke_function("hello").await.unwrap();
        assert_eq!(ok.status_code, 200);
        assert!(!ok.is_error());

        let failed = service.invoke_function("broken").await.unwrap();
        assert!(failed.is_error());
    }

    #[tokio::test]
    async fn test_invoke_rejects_empty_name() {
        let service = FunctionsService::new(paged(vec![]));
        let err = service.invoke_function("").await.unwrap_err();
        assert!(err.is_bad_request());
    }
}
