// goal.rs — Goal subcommands: create, list, show, update, progress, lifecycle.

use clap::Subcommand;
use uuid::Uuid;

use stride_goal::{
    Frequency, Goal, GoalCategory, GoalDraft, GoalPatch, GoalService, GoalStatus, Periodicity,
};

#[derive(Subcommand)]
pub enum GoalCommands {
    /// Create a new goal.
    Create {
        /// Owner of the goal.
        #[arg(long)]
        user: String,
        /// Category (physical_health, mental_health, nutrition, sleep, wellbeing).
        #[arg(long)]
        category: String,
        /// Short title (e.g., "7h sleep").
        title: String,
        /// What the user is trying to achieve.
        #[arg(long)]
        description: String,
        /// Target amount to reach (e.g., 7).
        #[arg(long)]
        total: u32,
        /// Unit of progress (e.g., "nights").
        #[arg(long)]
        unit: String,
        /// Cadence period (daily, weekly, monthly).
        #[arg(long, default_value = "daily")]
        periodicity: String,
        /// Repetitions per period.
        #[arg(long, default_value_t = 1)]
        times: u32,
    },
    /// List goals.
    List {
        /// Filter by owner.
        #[arg(long)]
        user: Option<String>,
        /// Filter by status (active, in_progress, completed, canceled).
        #[arg(long)]
        status: Option<String>,
        /// Filter by category.
        #[arg(long)]
        category: Option<String>,
    },
    /// Show one goal in detail.
    Show {
        /// Goal id.
        id: String,
    },
    /// Update title, description, frequency, or unit.
    Update {
        /// Goal id.
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        periodicity: Option<String>,
        #[arg(long)]
        times: Option<u32>,
        #[arg(long)]
        unit: Option<String>,
    },
    /// Mark a goal as started (active -> in_progress).
    Start {
        /// Goal id.
        id: String,
    },
    /// Record progress toward a goal.
    Progress {
        /// Goal id.
        id: String,
        /// Amount of progress to add.
        amount: i64,
    },
    /// Cancel a goal (terminal).
    Cancel {
        /// Goal id.
        id: String,
    },
    /// Delete a goal record entirely.
    Delete {
        /// Goal id.
        id: String,
    },
}

pub fn execute(cmd: &GoalCommands, service: &GoalService) -> anyhow::Result<()> {
    match cmd {
        GoalCommands::Create {
            user,
            category,
            title,
            description,
            total,
            unit,
            periodicity,
            times,
        } => create(
            service,
            user,
            category,
            title,
            description,
            *total,
            unit,
            periodicity,
            *times,
        ),
        GoalCommands::List {
            user,
            status,
            category,
        } => list(
            service,
            user.as_deref(),
            status.as_deref(),
            category.as_deref(),
        ),
        GoalCommands::Show { id } => show(service, id),
        GoalCommands::Update {
            id,
            title,
            description,
            periodicity,
            times,
            unit,
        } => update(
            service,
            id,
            title.clone(),
            description.clone(),
            periodicity.as_deref(),
            *times,
            unit.clone(),
        ),
        GoalCommands::Start { id } => start(service, id),
        GoalCommands::Progress { id, amount } => progress(service, id, *amount),
        GoalCommands::Cancel { id } => cancel(service, id),
        GoalCommands::Delete { id } => delete(service, id),
    }
}

fn parse_id(id: &str) -> anyhow::Result<Uuid> {
    Uuid::parse_str(id).map_err(|_| anyhow::anyhow!("invalid goal id: {}", id))
}

#[allow(clippy::too_many_arguments)]
fn create(
    service: &GoalService,
    user: &str,
    category: &str,
    title: &str,
    description: &str,
    total: u32,
    unit: &str,
    periodicity: &str,
    times: u32,
) -> anyhow::Result<()> {
    let draft = GoalDraft {
        user_id: user.to_string(),
        category: category.parse::<GoalCategory>()?,
        title: title.to_string(),
        description: description.to_string(),
        frequency: Frequency {
            periodicity: periodicity.parse::<Periodicity>()?,
            times_per_period: times,
        },
        total,
        unit: unit.to_string(),
    };

    let goal = service.create(draft)?;
    println!("Goal created: {}", goal.id);
    print_goal(&goal);
    Ok(())
}

fn list(
    service: &GoalService,
    user: Option<&str>,
    status: Option<&str>,
    category: Option<&str>,
) -> anyhow::Result<()> {
    let mut goals = match user {
        Some(user) => service.list_by_user(user)?,
        None => service.list()?,
    };
    if let Some(status) = status {
        let status = status.parse::<GoalStatus>()?;
        goals.retain(|g| g.status == status);
    }
    if let Some(category) = category {
        let category = category.parse::<GoalCategory>()?;
        goals.retain(|g| g.category == category);
    }

    if goals.is_empty() {
        println!("No goals found.");
        return Ok(());
    }
    for goal in &goals {
        println!(
            "{}  [{}] {:<12} {}/{} {}  {}",
            goal.id,
            goal.status,
            goal.category,
            goal.progress.completed,
            goal.progress.total,
            goal.progress.unit,
            goal.title,
        );
    }
    Ok(())
}

fn show(service: &GoalService, id: &str) -> anyhow::Result<()> {
    let id = parse_id(id)?;
    match service.find(id)? {
        Some(goal) => {
            print_goal(&goal);
            Ok(())
        }
        None => anyhow::bail!("goal not found: {}", id),
    }
}

fn update(
    service: &GoalService,
    id: &str,
    title: Option<String>,
    description: Option<String>,
    periodicity: Option<&str>,
    times: Option<u32>,
    unit: Option<String>,
) -> anyhow::Result<()> {
    let id = parse_id(id)?;
    let current = service
        .find(id)?
        .ok_or_else(|| anyhow::anyhow!("goal not found: {}", id))?;

    // Frequency is patched as a unit; fill missing halves from the goal.
    let frequency = if periodicity.is_some() || times.is_some() {
        Some(Frequency {
            periodicity: match periodicity {
                Some(p) => p.parse::<Periodicity>()?,
                None => current.frequency.periodicity,
            },
            times_per_period: times.unwrap_or(current.frequency.times_per_period),
        })
    } else {
        None
    };

    let goal = service.update(
        id,
        GoalPatch {
            title,
            description,
            frequency,
            unit,
        },
    )?;
    println!("Goal updated: {}", goal.id);
    print_goal(&goal);
    Ok(())
}

fn start(service: &GoalService, id: &str) -> anyhow::Result<()> {
    let goal = service.start(parse_id(id)?)?;
    println!("Goal started: {} ({})", goal.id, goal.status);
    Ok(())
}

fn progress(service: &GoalService, id: &str, amount: i64) -> anyhow::Result<()> {
    let (goal, delta) = service.advance_progress(parse_id(id)?, amount)?;
    println!(
        "Progress: {} -> {} of {} {} (+{})",
        delta.old_completed, delta.new_completed, delta.total, delta.unit, delta.effective_increment,
    );
    if delta.completed {
        println!("Goal completed: {}", goal.id);
    }
    Ok(())
}

fn cancel(service: &GoalService, id: &str) -> anyhow::Result<()> {
    let goal = service.cancel(parse_id(id)?)?;
    println!("Goal canceled: {}", goal.id);
    Ok(())
}

fn delete(service: &GoalService, id: &str) -> anyhow::Result<()> {
    let id = parse_id(id)?;
    service.delete(id)?;
    println!("Goal deleted: {}", id);
    Ok(())
}

fn print_goal(goal: &Goal) {
    println!("  Title:       {}", goal.title);
    println!("  Description: {}", goal.description);
    println!("  Owner:       {}", goal.user_id);
    println!("  Category:    {}", goal.category);
    println!("  Status:      {}", goal.status);
    println!(
        "  Progress:    {}/{} {} ({:.0}%)",
        goal.progress.completed,
        goal.progress.total,
        goal.progress.unit,
        goal.percent_complete() * 100.0,
    );
    println!(
        "  Frequency:   {}x {}",
        goal.frequency.times_per_period, goal.frequency.periodicity,
    );
    println!("  Started:     {}", goal.start_date);
}
