//! Post Review Workflow
//!
//! This example walks a blog post through submission, review and publication.
//!
//! Key concepts:
//! - Nested states (`submitted.awaiting_review`, `submitted.reviewing`)
//! - Events bubbling to the state that declares them
//! - Per-state behavior reading the resource
//! - Checkpointing and restoring a manager
//!
//! Run with: cargo run --example post_review

use serde_json::json;
use statetree::adapters::StateStore;
use statetree::builder::StateBuilder;
use statetree::checkpoint::Checkpoint;
use statetree::core::{EventSpec, StateBehavior, StateContext, StateError, StateHistory};
use statetree::manager::StateManager;

#[derive(Debug, Default)]
struct Post {
    title: String,
    state: Option<String>,
    feedback: Vec<String>,
}

impl StateStore for Post {
    fn read_state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    fn write_state(&mut self, path: &str) {
        self.state = Some(path.to_string());
    }
}

struct Announce;

impl StateBehavior<Post> for Announce {
    fn entered(&self, ctx: &mut StateContext<'_, Post>) {
        println!("  [Published] \"{}\" is live", ctx.resource().title);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Post Review Workflow ===\n");

    let definition = StateBuilder::<Post>::new()
        .initial_state("draft")
        .event(EventSpec::new("reject").transitions_to("rejected"))
        .state("draft", |s| {
            s.event(EventSpec::new("submit").transitions_to("submitted.awaiting_review"))
        })
        .state("submitted", |s| {
            s.event_with("comment", |e| {
                e.handler(|ctx, args| {
                    let text = args
                        .first()
                        .and_then(|v| v.as_str())
                        .ok_or_else(|| StateError::handler(ctx.event(), "comment text missing"))?;
                    ctx.resource_mut().feedback.push(text.to_string());
                    Ok(())
                })
            })
            .state("awaiting_review", |s| {
                s.event(EventSpec::new("review").transitions_to("reviewing"))
            })
            .state("reviewing", |s| {
                s.event(EventSpec::new("accept").transitions_to("published"))
            })
        })
        .state("published", |s| s.behavior(Announce))
        .leaf("rejected")
        .build()?;

    let post = Post {
        title: "Hierarchical states in practice".to_string(),
        ..Post::default()
    };
    let mut manager = StateManager::with_hooks(definition.clone(), post, StateHistory::new())?;
    println!("Initial state: {:?}", manager.current_path());

    manager.send_event("submit", &[])?;
    manager.send_event("comment", &[json!("Needs a diagram")])?;
    println!("After submit: {:?}", manager.current_path());
    println!("Available events: {:?}", manager.available_events());

    let saved = manager.checkpoint().to_json()?;
    println!("\n  [Checkpoint] {} bytes of JSON\n", saved.len());

    let restored = Checkpoint::from_json(&saved)?.restore(
        definition,
        Post {
            title: manager.resource().title.clone(),
            ..Post::default()
        },
        StateHistory::new(),
    )?;
    println!("Restored state: {:?}", restored.current_path());

    if let Err(err) = manager.send_event("accept", &[]) {
        println!("Rejected early accept: {err}");
    }

    manager.send_event("review", &[])?;
    manager.send_event("accept", &[])?;

    println!("\nFeedback: {:?}", manager.resource().feedback);
    println!("Path taken: {:?}", manager.hooks().get_path());
    println!("\nWorkflow completed successfully!");
    Ok(())
}
