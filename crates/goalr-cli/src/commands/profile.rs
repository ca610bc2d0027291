//! Profile commands.
//!
//! The profile owns the daily goal; the ledger picks it up on its next load.

use clap::Subcommand;
use goalr_core::profile::GOAL_PICKER_RANGE;
use goalr_core::{Config, Database, GoalLevel, UserProfile, GOAL_PRESETS};

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Show the registered profile
    Show,
    /// Register (or replace) the profile
    Register {
        name: String,
        username: String,
        /// Daily step goal, defaults to `profile.default_goal`
        #[arg(long)]
        goal: Option<u32>,
    },
    /// Change the daily goal
    SetGoal {
        #[arg(allow_negative_numbers = true)]
        goal: i64,
    },
    /// List goal presets and levels
    Levels,
}

pub fn run(action: ProfileAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ProfileAction::Show => {
            let db = Database::open()?;
            match UserProfile::load(&db)? {
                Some(profile) => {
                    let out = serde_json::json!({
                        "profile": profile,
                        "level": profile.level().label(),
                    });
                    println!("{}", serde_json::to_string_pretty(&out)?);
                }
                None => {
                    eprintln!("no profile registered");
                    std::process::exit(1);
                }
            }
        }
        ProfileAction::Register {
            name,
            username,
            goal,
        } => {
            let goal = goal.unwrap_or_else(|| Config::load_or_default().profile.default_goal);
            let profile = UserProfile::new(&name, &username, goal)?;
            let mut db = Database::open()?;
            profile.save(&mut db)?;
            warn_outside_picker(goal);
            println!("registered {} with a goal of {goal}", profile.name);
        }
        ProfileAction::SetGoal { goal } => {
            let goal = goalr_core::profile::validate_goal(goal)?;
            let mut db = Database::open()?;
            let mut profile = UserProfile::load(&db)?
                .ok_or("no profile registered; run `goalr profile register` first")?;
            profile.daily_goal = goal;
            profile.save(&mut db)?;
            warn_outside_picker(goal);
            println!("daily goal set to {goal} ({})", GoalLevel::for_goal(goal).label());
        }
        ProfileAction::Levels => {
            for preset in GOAL_PRESETS {
                println!("{:>6}  {:<16} {}", preset.steps, preset.title, preset.description);
            }
        }
    }
    Ok(())
}

fn warn_outside_picker(goal: u32) {
    if !GOAL_PICKER_RANGE.contains(&goal) {
        eprintln!(
            "note: {goal} is outside the usual {}-{} range",
            GOAL_PICKER_RANGE.start(),
            GOAL_PICKER_RANGE.end()
        );
    }
}
