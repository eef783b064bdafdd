//! Routes an invocation to passthrough or generate-and-commit.

use std::ffi::OsString;
use std::future::Future;

use tracing::debug;

use crate::commit::{DiffPayload, collect_diff, generate_message};
use crate::config::{self, GenerationSettings};
use crate::error::NscmError;
use crate::git::Vcs;
use crate::llm::{MessageProvider, build_provider};
use crate::trigger::{GenerateRequest, TriggerDecision, classify};

type SettingsSource = Box<dyn Fn() -> GenerationSettings + Send + Sync>;
type ProviderFactory =
    Box<dyn Fn(&GenerationSettings) -> Result<Box<dyn MessageProvider>, NscmError> + Send + Sync>;

/// Result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub exit_code: i32,
    /// The generated message, when one was produced.
    pub message: Option<String>,
}

impl Outcome {
    fn exited(exit_code: i32) -> Self {
        Self {
            exit_code,
            message: None,
        }
    }
}

/// Print a failure as a single line plus an optional hint.
pub fn report(err: &NscmError) {
    eprintln!("❌ {}: {}", err.kind(), err);
    if let Some(hint) = err.hint() {
        eprintln!("   {}", hint);
    }
}

fn print_summary(payload: &DiffPayload, message: &str) {
    println!("📊 {}", payload.stats);
    if payload.truncated {
        println!(
            "   (diff truncated to {} of {} lines for generation)",
            payload.sent_lines(),
            payload.total_lines
        );
    }
    println!("💬 {}", message);
}

pub struct Dispatcher<V> {
    vcs: V,
    settings: SettingsSource,
    providers: ProviderFactory,
}

impl<V: Vcs> Dispatcher<V> {
    /// Dispatcher reading settings from the environment and `~/.nscmrc`
    /// once a trigger is detected.
    pub fn new(vcs: V) -> Self {
        Self {
            vcs,
            settings: Box::new(config::resolve_from_environment),
            providers: Box::new(build_provider),
        }
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = Box::new(move || settings.clone());
        self
    }

    pub fn with_provider_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&GenerationSettings) -> Result<Box<dyn MessageProvider>, NscmError>
            + Send
            + Sync
            + 'static,
    {
        self.providers = Box::new(factory);
        self
    }

    /// Handle one invocation. `args` excludes the program name.
    ///
    /// `interrupt` resolving during generation aborts with
    /// [`Interrupted`](NscmError::Interrupted) before anything is committed.
    pub async fn run<I>(&self, args: &[OsString], interrupt: I) -> Outcome
    where
        I: Future<Output = ()>,
    {
        let request = match classify(args) {
            TriggerDecision::Passthrough => return self.passthrough(args).await,
            TriggerDecision::Generate(request) => request,
        };

        // Interrupt wins when both are ready.
        let generated = tokio::select! {
            biased;
            _ = interrupt => Err(NscmError::Interrupted),
            result = self.generate(&request) => result,
        };

        let (message, payload) = match generated {
            Ok(generated) => generated,
            Err(e) => {
                report(&e);
                return Outcome::exited(e.exit_code());
            }
        };

        print_summary(&payload, &message);

        if request.preview {
            println!("Preview only. Nothing committed.");
            return Outcome {
                exit_code: 0,
                message: Some(message),
            };
        }

        let commit_args = request.commit_args(args, &message);
        let exit_code = match self.vcs.commit(&commit_args).await {
            Ok(code) => code,
            Err(e) => {
                let err = NscmError::from(e);
                report(&err);
                err.exit_code()
            }
        };

        Outcome {
            exit_code,
            message: Some(message),
        }
    }

    async fn passthrough(&self, args: &[OsString]) -> Outcome {
        match self.vcs.passthrough(args).await {
            Ok(code) => Outcome::exited(code),
            Err(e) => {
                let err = NscmError::from(e);
                report(&err);
                Outcome::exited(err.exit_code())
            }
        }
    }

    /// Diff, then provider. Settings are only resolved once a trigger fired.
    async fn generate(
        &self,
        request: &GenerateRequest,
    ) -> Result<(String, DiffPayload), NscmError> {
        let settings = (self.settings)();
        debug!("Resolved settings: {:?}", settings);

        let payload = collect_diff(&self.vcs, request, settings.max_diff_lines).await?;
        let provider = (self.providers)(&settings)?;

        println!(
            "Generating commit message with {} ({})...",
            provider.name(),
            settings.model
        );

        let message = generate_message(provider.as_ref(), &settings, &payload).await?;
        Ok((message, payload))
    }
}
