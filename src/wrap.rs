//! Tool instrumentation.
//!
//! [`WrappedTool`] runs a host tool unchanged and reports its lifecycle
//! around it. Metadata extractors are optional and each one runs inside its
//! own fault boundary: an extractor that errors or panics only loses its
//! fragment of metadata.

use std::{
    fmt,
    future::Future,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::Arc,
};

use toolsight_core::{merge, Metadata};

use crate::tracker::Tracker;

/// Error type metadata extractors may return.
pub type ExtractorError = Box<dyn std::error::Error + Send + Sync>;

/// Return type of every metadata extractor.
pub type ExtractorResult = Result<Metadata, ExtractorError>;

type InputExtractor<P, M> = Arc<dyn Fn(&P, Option<&M>) -> ExtractorResult + Send + Sync>;
type OutputExtractor<R> = Arc<dyn Fn(&R) -> ExtractorResult + Send + Sync>;
type ErrorExtractor<E> = Arc<dyn Fn(&E) -> ExtractorResult + Send + Sync>;

/// How a tool is instrumented.
///
/// `P` and `M` are the tool's parameter and call-metadata types, `R` and `E`
/// its success and error types.
pub struct WrapOptions<P, M, R, E> {
    get_metadata: Option<InputExtractor<P, M>>,
    get_output_metadata: Option<OutputExtractor<R>>,
    get_error_metadata: Option<ErrorExtractor<E>>,
    track_invocation: bool,
    rethrow_errors: bool,
}

impl<P, M, R, E> WrapOptions<P, M, R, E> {
    /// Tracks invocations and re-raises tool errors, with no extractors.
    pub fn new() -> Self {
        Self {
            get_metadata: None,
            get_output_metadata: None,
            get_error_metadata: None,
            track_invocation: true,
            rethrow_errors: true,
        }
    }

    /// Extracts invocation metadata from the call arguments.
    pub fn get_metadata<F>(mut self, extract: F) -> Self
    where
        F: Fn(&P, Option<&M>) -> ExtractorResult + Send + Sync + 'static,
    {
        self.get_metadata = Some(Arc::new(extract));
        self
    }

    /// Extracts success metadata from the tool's return value.
    pub fn get_output_metadata<F>(mut self, extract: F) -> Self
    where
        F: Fn(&R) -> ExtractorResult + Send + Sync + 'static,
    {
        self.get_output_metadata = Some(Arc::new(extract));
        self
    }

    /// Extracts failure metadata from the tool's error.
    pub fn get_error_metadata<F>(mut self, extract: F) -> Self
    where
        F: Fn(&E) -> ExtractorResult + Send + Sync + 'static,
    {
        self.get_error_metadata = Some(Arc::new(extract));
        self
    }

    /// Whether an invocation event is sent before the tool runs.
    pub fn track_invocation(mut self, enabled: bool) -> Self {
        self.track_invocation = enabled;
        self
    }

    /// Whether tool errors are returned to the caller after tracking.
    ///
    /// When disabled, a failed call returns `Ok(R::default())`.
    pub fn rethrow_errors(mut self, enabled: bool) -> Self {
        self.rethrow_errors = enabled;
        self
    }
}

impl<P, M, R, E> Default for WrapOptions<P, M, R, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, M, R, E> Clone for WrapOptions<P, M, R, E> {
    fn clone(&self) -> Self {
        Self {
            get_metadata: self.get_metadata.clone(),
            get_output_metadata: self.get_output_metadata.clone(),
            get_error_metadata: self.get_error_metadata.clone(),
            track_invocation: self.track_invocation,
            rethrow_errors: self.rethrow_errors,
        }
    }
}

impl<P, M, R, E> fmt::Debug for WrapOptions<P, M, R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrapOptions")
            .field("get_metadata", &self.get_metadata.is_some())
            .field("get_output_metadata", &self.get_output_metadata.is_some())
            .field("get_error_metadata", &self.get_error_metadata.is_some())
            .field("track_invocation", &self.track_invocation)
            .field("rethrow_errors", &self.rethrow_errors)
            .finish()
    }
}

/// A tool instrumented by [`Tracker::wrap`].
pub struct WrappedTool<F, P, M, R, E> {
    tracker: Tracker,
    tool_name: Arc<str>,
    tool: F,
    options: WrapOptions<P, M, R, E>,
}

impl<F, Fut, P, M, R, E> WrappedTool<F, P, M, R, E>
where
    F: Fn(P, Option<M>) -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    pub(crate) fn new(
        tracker: Tracker,
        tool_name: String,
        tool: F,
        options: WrapOptions<P, M, R, E>,
    ) -> Self {
        Self { tracker, tool_name: tool_name.into(), tool, options }
    }

    /// Name events are reported under.
    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    /// Calls the tool with tracking around it.
    ///
    /// 1. Extracts invocation metadata and, if enabled, waits for the
    ///    invocation event (retries included) before the tool starts.
    /// 2. Runs the tool with `params` and `meta` untouched.
    /// 3. Merges invocation metadata with outcome metadata (outcome keys
    ///    win) and waits for the success or failure event, which carries the
    ///    elapsed time since step 1 began.
    /// 4. Returns the tool's value unchanged, or its error unless
    ///    `rethrow_errors` is off, in which case `R::default()` is returned.
    ///
    /// # Errors
    ///
    /// Returns exactly the error the tool returned, when errors are
    /// re-raised. Tracking failures never surface here.
    pub async fn call(&self, params: P, meta: Option<M>) -> Result<R, E>
    where
        R: Default,
    {
        let start = self.tracker.clock().now();

        let invocation_metadata = self.options.get_metadata.as_ref().and_then(|extract| {
            self.extract_isolated("get_metadata", || extract(&params, meta.as_ref()))
        });

        if self.options.track_invocation {
            self.tracker.track_invocation(&self.tool_name, invocation_metadata.clone()).await;
        }

        match (self.tool)(params, meta).await {
            Ok(result) => {
                let duration_ms = self.tracker.clock().elapsed_ms(start);
                let output_metadata = self
                    .options
                    .get_output_metadata
                    .as_ref()
                    .and_then(|extract| {
                        self.extract_isolated("get_output_metadata", || extract(&result))
                    });
                let metadata = merge(invocation_metadata.as_ref(), output_metadata.as_ref());

                self.tracker
                    .track_success(&self.tool_name, Some(metadata), Some(duration_ms))
                    .await;
                Ok(result)
            },
            Err(error) => {
                let duration_ms = self.tracker.clock().elapsed_ms(start);
                let error_metadata = self
                    .options
                    .get_error_metadata
                    .as_ref()
                    .and_then(|extract| {
                        self.extract_isolated("get_error_metadata", || extract(&error))
                    });
                let metadata = merge(invocation_metadata.as_ref(), error_metadata.as_ref());

                self.tracker
                    .track_failure(&self.tool_name, Some(metadata), Some(duration_ms))
                    .await;
                if self.options.rethrow_errors {
                    Err(error)
                } else {
                    Ok(R::default())
                }
            },
        }
    }

    /// Runs one extractor, turning an error or panic into `None`.
    fn extract_isolated(
        &self,
        extractor: &'static str,
        extract: impl FnOnce() -> ExtractorResult,
    ) -> Option<Metadata> {
        let debug = self.tracker.debug();
        match catch_unwind(AssertUnwindSafe(extract)) {
            Ok(Ok(metadata)) => Some(metadata),
            Ok(Err(error)) => {
                if debug {
                    tracing::warn!(
                        tool_name = %self.tool_name,
                        extractor,
                        error = %error,
                        "Metadata extractor failed"
                    );
                }
                None
            },
            Err(_) => {
                if debug {
                    tracing::warn!(
                        tool_name = %self.tool_name,
                        extractor,
                        "Metadata extractor panicked"
                    );
                }
                None
            },
        }
    }
}

impl<F: Clone, P, M, R, E> Clone for WrappedTool<F, P, M, R, E> {
    fn clone(&self) -> Self {
        Self {
            tracker: self.tracker.clone(),
            tool_name: self.tool_name.clone(),
            tool: self.tool.clone(),
            options: self.options.clone(),
        }
    }
}

impl<F, P, M, R, E> fmt::Debug for WrappedTool<F, P, M, R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrappedTool")
            .field("tool_name", &self.tool_name)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
