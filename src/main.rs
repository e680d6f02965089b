use std::sync::Arc;

use anyhow::{Context as _, bail};

use artist_onboarding::api::{HttpOnboardingApi, OnboardingApi};
use artist_onboarding::config::ClientConfig;
use artist_onboarding::onboarding::{
    ExitReason, Navigator, OnboardingContext, StepId, StepRegistry, WizardShell, WizardState,
    step_path,
};

/// Prints router intents instead of driving a browser.
struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn push(&self, path: &str) {
        eprintln!("   → push {path}");
    }

    fn replace(&self, path: &str) {
        eprintln!("   → replace {path}");
    }

    fn leave(&self, reason: ExitReason) {
        match reason {
            ExitReason::AlreadyDone => eprintln!("   → onboarding already done, leaving"),
            ExitReason::Completed => eprintln!("   → onboarding completed, leaving"),
        }
    }
}

fn usage() -> ! {
    eprintln!("Usage:");
    eprintln!("  onboarding status <artist-id>");
    eprintln!("  onboarding walk <artist-id> [step]   (Next until the last step)");
    eprintln!("  onboarding skip <artist-id> <step>");
    eprintln!("  onboarding complete <artist-id>");
    std::process::exit(2);
}

async fn print_overview(wizard: &WizardShell<ConsoleNavigator>) {
    let progress = wizard.progress().await;
    eprintln!(
        "   Progress: {}/{} ({:.0}%)",
        progress.completed, progress.total, progress.percent
    );
    for step in wizard.resolved_steps().await {
        let marker = if wizard.active_step() == Some(step.id) {
            "▶"
        } else if step.is_completed {
            "✓"
        } else {
            " "
        };
        eprintln!(
            "   {marker} {:<14} {:<24} {}",
            step.id.as_str(),
            step.title,
            if step.is_required { "required" } else { "optional" }
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (command, artist_id) = match args.as_slice() {
        [command, artist_id, ..] => (command.as_str(), artist_id.clone()),
        _ => usage(),
    };
    let step_arg = args.get(2).map(|s| s.parse::<StepId>()).transpose()?;

    let config = ClientConfig::from_env().context("loading client configuration")?;
    eprintln!("🎵 Artist onboarding v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {}", config.base_url);
    eprintln!("   Artist: {artist_id}");

    let api: Arc<dyn OnboardingApi> = Arc::new(HttpOnboardingApi::new(&config)?);
    let context = OnboardingContext::mount(
        artist_id,
        api,
        Arc::new(StepRegistry::artist()),
        None,
    );
    let mut wizard = WizardShell::new(Arc::clone(&context), ConsoleNavigator);

    let location = step_arg.map(step_path).unwrap_or_else(|| "/onboarding".to_string());
    let state = wizard.start(&location).await.clone();

    match (command, state) {
        (_, WizardState::Error(message)) => bail!("could not load onboarding status: {message}"),
        (_, WizardState::Complete) => {}
        (_, WizardState::Loading) => bail!("onboarding status still loading"),
        ("status", WizardState::Active(_)) => print_overview(&wizard).await,
        ("walk", WizardState::Active(_)) => {
            // Next on the last step would complete onboarding; stop short of it.
            while let Some(step) = wizard.active_step() {
                eprintln!("   At {step}");
                if context.registry().next_after(step).is_none() {
                    break;
                }
                wizard.next().await?;
            }
            print_overview(&wizard).await;
        }
        ("skip", WizardState::Active(step)) => {
            if step_arg.is_none() {
                usage();
            }
            wizard.skip().await?;
            eprintln!("   Skipped {step}");
            print_overview(&wizard).await;
        }
        ("complete", WizardState::Active(_)) => {
            context.complete_onboarding().await?;
            eprintln!("   Onboarding marked complete");
        }
        _ => usage(),
    }

    context.unmount().await;
    Ok(())
}
