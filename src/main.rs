use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use strategy_copilot::config::CopilotConfig;
use strategy_copilot::error::StepError;
use strategy_copilot::flow::{FileSlot, FlowStore, StateSlot, Wizard, WizardStep};
use strategy_copilot::gateway::create_gateway;

type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = CopilotConfig::from_env().context("invalid configuration")?;
    let gateway = create_gateway(&config.gateway).context("failed to create gateway")?;

    let slot: Arc<dyn StateSlot> = Arc::new(FileSlot::new(config.state_dir.clone()));
    let store = FlowStore::open(slot).await;
    let wizard = Wizard::new(store, gateway);

    eprintln!("🧭 Strategy Copilot v{}", env!("CARGO_PKG_VERSION"));
    eprintln!(
        "   Backend: {}",
        if config.gateway.use_mock {
            "mock".to_string()
        } else {
            config.gateway.api_base_url.clone()
        }
    );
    eprintln!("   State: {}", config.state_dir.display());
    eprintln!("   Type /back for the previous step, /restart to start over, /quit to exit.\n");

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut step = wizard.resume().await;

    loop {
        if let Some(target) = wizard.activate(step).await {
            step = target;
            continue;
        }

        let next = match step {
            WizardStep::Entry => entry_step(&wizard, &mut input).await?,
            WizardStep::GoalFraming => goal_step(&wizard, &mut input).await?,
            WizardStep::Options => options_step(&wizard, &mut input).await?,
            WizardStep::Checklist => checklist_step(&wizard, &mut input).await?,
            WizardStep::Export => export_step(&wizard, &config, &mut input).await?,
        };

        match next {
            Flow::Stay => {}
            Flow::Go(target) => step = target,
            Flow::Back => step = wizard.back(step).await,
            Flow::Restart => step = wizard.restart().await,
            Flow::Quit => break,
        }
    }

    eprintln!("Progress saved. Bye!");
    Ok(())
}

/// What the driver does after a step handler returns.
enum Flow {
    Stay,
    Go(WizardStep),
    Back,
    Restart,
    Quit,
}

enum Line {
    Text(String),
    Back,
    Restart,
    Quit,
}

async fn read_line(input: &mut Input, prompt: &str) -> anyhow::Result<Line> {
    eprint!("{prompt} > ");
    let Some(line) = input.next_line().await.context("failed to read stdin")? else {
        return Ok(Line::Quit); // EOF
    };
    Ok(match line.trim() {
        "/quit" => Line::Quit,
        "/back" => Line::Back,
        "/restart" => Line::Restart,
        text => Line::Text(text.to_string()),
    })
}

/// Map a step outcome onto the driver loop, printing failures.
fn settle<T>(step: WizardStep, result: Result<T, StepError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            eprintln!("❌ {}", e.user_message(step));
            None
        }
    }
}

macro_rules! read_or_leave {
    ($input:expr, $prompt:expr) => {
        match read_line($input, $prompt).await? {
            Line::Text(text) => text,
            Line::Back => return Ok(Flow::Back),
            Line::Restart => return Ok(Flow::Restart),
            Line::Quit => return Ok(Flow::Quit),
        }
    };
}

fn advance(step: WizardStep, result: Result<WizardStep, StepError>) -> Flow {
    match result {
        Err(StepError::Redirect(target)) => Flow::Go(target),
        other => settle(step, other).map_or(Flow::Stay, Flow::Go),
    }
}

async fn entry_step(wizard: &Wizard, input: &mut Input) -> anyhow::Result<Flow> {
    println!("\nWhich career decision do you want to clarify in the next 90 days?");
    let answer = read_or_leave!(input, "answer");
    Ok(advance(WizardStep::Entry, wizard.submit_entry(&answer).await))
}

async fn goal_step(wizard: &Wizard, input: &mut Input) -> anyhow::Result<Flow> {
    println!("\nFrame your goal.");
    let north_star = read_or_leave!(input, "north star");
    let constraints = read_or_leave!(input, "constraints");
    Ok(advance(
        WizardStep::GoalFraming,
        wizard.submit_goal(&north_star, &constraints).await,
    ))
}

async fn options_step(wizard: &Wizard, input: &mut Input) -> anyhow::Result<Flow> {
    let state = wizard.store().snapshot().await;
    let options = state.visible_options();
    if options.is_empty() {
        println!("\nNo options came back for this goal. Try framing it differently.");
        return Ok(Flow::Go(WizardStep::GoalFraming));
    }
    println!("\nPick a strategic option:");
    for (i, option) in options.iter().enumerate() {
        println!("  {}. {} — {}", i + 1, option.title, option.description);
    }

    let choice = read_or_leave!(input, "option");
    // Accept either the list number or the option id.
    let option_id = choice
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| options.get(i))
        .map(|o| o.id.clone())
        .unwrap_or(choice);

    Ok(advance(WizardStep::Options, wizard.choose_option(&option_id).await))
}

async fn checklist_step(wizard: &Wizard, input: &mut Input) -> anyhow::Result<Flow> {
    let state = wizard.store().snapshot().await;
    if let Some(ref option) = state.selected_option {
        println!("\nAction plan for: {}", option.title);
    }
    for item in &state.checklist {
        println!("  • {item}");
    }

    read_or_leave!(input, "press enter to continue to export");
    Ok(advance(WizardStep::Checklist, wizard.confirm_checklist().await))
}

async fn export_step(
    wizard: &Wizard,
    config: &CopilotConfig,
    input: &mut Input,
) -> anyhow::Result<Flow> {
    println!("\nDownload your final plan: [e]xport, /back, /restart or /quit.");
    let choice = read_or_leave!(input, "export");
    if !choice.eq_ignore_ascii_case("e") && !choice.eq_ignore_ascii_case("export") {
        return Ok(Flow::Stay);
    }

    let document = match wizard.export().await {
        Err(StepError::Redirect(target)) => return Ok(Flow::Go(target)),
        other => match settle(WizardStep::Export, other) {
            Some(document) => document,
            None => return Ok(Flow::Stay),
        },
    };

    tokio::fs::create_dir_all(&config.export_dir)
        .await
        .with_context(|| format!("create export directory {}", config.export_dir.display()))?;
    let path = config.export_dir.join(document.file_name());
    tokio::fs::write(&path, &document.bytes)
        .await
        .with_context(|| format!("write plan {}", path.display()))?;
    println!("✅ Plan written to {}", path.display());
    Ok(Flow::Stay)
}
