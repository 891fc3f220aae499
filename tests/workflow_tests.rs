//! End-to-end workflows driven through the public API.

use chrono::Duration as ChronoDuration;
use serde_json::{json, Value};
use statetree::adapters::{DeferredCommit, Property, StateStore};
use statetree::builder::StateBuilder;
use statetree::checkpoint::Checkpoint;
use statetree::core::{
    Definition, EventSpec, StateBehavior, StateContext, StateError, StateHistory, StateTransition,
};
use statetree::manager::{StateManager, TransitionHooks};
use statetree::schedule::{deliver_all, DelayedEvents};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

// Post review workflow

#[derive(Debug, Default)]
struct Post {
    state: Option<String>,
    workflow_state: Option<String>,
    title: String,
}

impl StateStore for Post {
    fn read_state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    fn write_state(&mut self, path: &str) {
        self.state = Some(path.to_string());
    }
}

fn workflow_state(post: &Post) -> Option<&str> {
    post.workflow_state.as_deref()
}

fn set_workflow_state(post: &mut Post, path: &str) {
    post.workflow_state = Some(path.to_string());
}

struct Published;

impl StateBehavior<Post> for Published {
    fn entered(&self, ctx: &mut StateContext<'_, Post>) {
        let title = ctx.resource().title.clone();
        ctx.context_mut().insert("title".to_string(), title);
    }
}

fn post_states<R: 'static>() -> StateBuilder<R> {
    StateBuilder::new()
        .state("unsubmitted", |s| {
            s.event(EventSpec::new("submit").transitions_to("submitted.awaiting_review"))
        })
        .state("submitted", |s| {
            s.state("awaiting_review", |s| {
                s.event(EventSpec::new("review").transitions_to("submitted.reviewing"))
            })
            .state("reviewing", |s| {
                s.event(EventSpec::new("accept").transitions_to("active"))
                    .event(EventSpec::new("clarify").transitions_to("submitted.clarifying"))
            })
            .state("clarifying", |s| {
                s.event(EventSpec::new("review").transitions_to("submitted.reviewing"))
            })
        })
        .leaf("active")
        .leaf("rejected")
}

fn post_definition() -> Arc<Definition<Post>> {
    post_states()
        .reopen("active", |s| s.behavior(Published))
        .build()
        .unwrap()
}

fn post(state: Option<&str>) -> Post {
    Post {
        state: state.map(str::to_string),
        ..Post::default()
    }
}

#[test]
fn initial_state_defaults_to_first_declared() {
    let manager = StateManager::new(post_definition(), post(None)).unwrap();
    assert_eq!(manager.current_path().as_deref(), Some("unsubmitted"));
    assert_eq!(manager.resource().state.as_deref(), Some("unsubmitted"));
}

#[test]
fn initial_state_can_be_declared() {
    let definition: Arc<Definition<Post>> = post_states()
        .initial_state("submitted.awaiting_review")
        .build()
        .unwrap();

    let manager = StateManager::new(Arc::clone(&definition), post(None)).unwrap();
    assert_eq!(manager.current_path().as_deref(), Some("submitted.awaiting_review"));

    let manager = StateManager::new(definition, post(Some(""))).unwrap();
    assert_eq!(manager.current_path().as_deref(), Some("submitted.awaiting_review"));
}

#[test]
fn initial_state_is_read_from_resource() {
    let manager = StateManager::new(post_definition(), post(Some("active"))).unwrap();
    assert_eq!(manager.current_path().as_deref(), Some("active"));
}

#[test]
fn context_holds_host_values() {
    let mut manager = StateManager::new(post_definition(), post(None)).unwrap();
    manager
        .context_mut()
        .insert("user".to_string(), "brogrammer".to_string());
    assert_eq!(manager.context().get("user").map(String::as_str), Some("brogrammer"));
}

#[test]
fn transitions_accept_absolute_and_sibling_paths() {
    let mut manager = StateManager::new(post_definition(), post(None)).unwrap();

    manager.transition_to("submitted.clarifying").unwrap();
    assert_eq!(manager.resource().state.as_deref(), Some("submitted.clarifying"));

    manager.transition_to("reviewing").unwrap();
    assert_eq!(manager.current_path().as_deref(), Some("submitted.reviewing"));

    manager.transition_to("rejected").unwrap();
    assert_eq!(manager.current_path().as_deref(), Some("rejected"));

    let result = manager.transition_to("reviewing");
    assert_eq!(
        result.err(),
        Some(StateError::StateNotFound {
            path: "reviewing".to_string()
        })
    );
    assert_eq!(manager.resource().state.as_deref(), Some("rejected"));
}

#[test]
fn events_move_between_states() {
    let mut manager = StateManager::new(post_definition(), post(None)).unwrap();

    manager.send_event("submit", &[]).unwrap();
    assert_eq!(manager.current_path().as_deref(), Some("submitted.awaiting_review"));
    assert_eq!(manager.resource().state.as_deref(), Some("submitted.awaiting_review"));

    let result = manager.send_event("submit", &[]);
    assert!(matches!(result, Err(StateError::InvalidEvent { .. })));
    assert_eq!(manager.resource().state.as_deref(), Some("submitted.awaiting_review"));

    manager.send_event("review", &[]).unwrap();
    assert_eq!(manager.current_path().as_deref(), Some("submitted.reviewing"));
}

#[test]
fn post_review_runs_from_unset_path_to_active() {
    let definition: Arc<Definition<Post>> =
        post_states().initial_state("unsubmitted").build().unwrap();
    let mut manager =
        StateManager::with_hooks(definition, post(Some("")), StateHistory::new()).unwrap();
    assert_eq!(manager.resource().state.as_deref(), Some("unsubmitted"));

    for (event, expected) in [
        ("submit", "submitted.awaiting_review"),
        ("review", "submitted.reviewing"),
        ("accept", "active"),
    ] {
        manager.send_event(event, &[]).unwrap();
        assert_eq!(manager.resource().state.as_deref(), Some(expected));
    }

    assert!(!manager.respond_to_event("review"));
    let result = manager.send_event("review", &[]);
    assert_eq!(
        result,
        Err(StateError::InvalidEvent {
            event: "review".to_string(),
            state: "active".to_string(),
        })
    );
    assert_eq!(manager.resource().state.as_deref(), Some("active"));
    assert_eq!(manager.current_event(), None);
    assert_eq!(
        manager.hooks().get_path(),
        vec!["unsubmitted", "submitted.awaiting_review", "submitted.reviewing", "active"]
    );
}

#[test]
fn alternate_property_holds_the_path() {
    let definition: Arc<Definition<Property<Post>>> = post_states().build().unwrap();
    let store = Property::new(Post::default(), workflow_state, set_workflow_state);
    let mut manager = StateManager::new(definition, store).unwrap();
    assert_eq!(manager.current_path().as_deref(), Some("unsubmitted"));

    manager.send_event("submit", &[]).unwrap();
    let post = manager.resource().resource();
    assert_eq!(post.workflow_state.as_deref(), Some("submitted.awaiting_review"));
    assert_eq!(post.state, None);

    assert!(manager.send_event("submit", &[]).is_err());
    manager.send_event("review", &[]).unwrap();
}

#[test]
fn only_leaf_states_can_be_current() {
    let mut manager = StateManager::new(post_definition(), post(None)).unwrap();
    let result = manager.transition_to("submitted");
    assert_eq!(
        result.err(),
        Some(StateError::InvalidTransition {
            path: "submitted".to_string()
        })
    );
    assert_eq!(manager.current_path().as_deref(), Some("unsubmitted"));
}

#[test]
fn transition_to_current_state_is_allowed() {
    let mut manager = StateManager::with_hooks(
        post_definition(),
        post(Some("submitted.awaiting_review")),
        StateHistory::new(),
    )
    .unwrap();

    let transition = manager.transition_to("submitted.awaiting_review").unwrap();
    assert!(transition.is_noop());
    assert_eq!(manager.current_path().as_deref(), Some("submitted.awaiting_review"));
    assert_eq!(manager.hooks().transitions().len(), 1);
}

#[test]
fn state_callbacks_reach_the_resource() {
    let mut resource = post(None);
    resource.title = "some title".to_string();
    let mut manager = StateManager::new(post_definition(), resource).unwrap();

    manager.transition_to("active").unwrap();
    assert_eq!(manager.context().get("title").map(String::as_str), Some("some title"));

    let active = manager.current_state().and_then(|id| manager.state(id)).unwrap();
    assert_eq!(active.path(), "active");
    assert_eq!(active.resource().title, "some title");
}

// User moderation workflow

#[derive(Debug, Default)]
struct User {
    state: Option<String>,
    notes: Option<String>,
    paid: bool,
    has_prizes: bool,
    enter_counts: BTreeMap<String, usize>,
    exit_counts: BTreeMap<String, usize>,
}

impl User {
    fn entered(&self, path: &str) -> usize {
        self.enter_counts.get(path).copied().unwrap_or_default()
    }

    fn exited(&self, path: &str) -> usize {
        self.exit_counts.get(path).copied().unwrap_or_default()
    }
}

impl StateStore for User {
    fn read_state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    fn write_state(&mut self, path: &str) {
        self.state = Some(path.to_string());
    }
}

struct TrackEnterExit;

impl StateBehavior<User> for TrackEnterExit {
    fn enter(&self, ctx: &mut StateContext<'_, User>) {
        let path = ctx.path().to_string();
        *ctx.resource_mut().enter_counts.entry(path).or_default() += 1;
    }

    fn exit(&self, ctx: &mut StateContext<'_, User>) {
        let path = ctx.path().to_string();
        *ctx.resource_mut().exit_counts.entry(path).or_default() += 1;
    }
}

#[derive(Debug, Default)]
struct Observed {
    will: Option<(Option<String>, StateTransition)>,
    did: Option<(Option<String>, StateTransition)>,
}

impl TransitionHooks<User> for Observed {
    fn will_transition(&mut self, resource: &mut User, transition: &StateTransition) {
        self.will = Some((resource.state.clone(), transition.clone()));
    }

    fn did_transition(&mut self, resource: &mut User, transition: &StateTransition) {
        self.did = Some((resource.state.clone(), transition.clone()));
    }
}

fn user_definition() -> Arc<Definition<User>> {
    StateBuilder::new()
        .initial_state("unregistered")
        .event_with("ban", |e: EventSpec<User>| {
            e.transitions_to("inactive.banned").handler(|ctx, args| {
                let reason = args.first().and_then(Value::as_str).unwrap_or_default();
                ctx.resource_mut().notes = Some(format!("Banned because: {reason}"));
                Ok(())
            })
        })
        .state("unregistered", |s| {
            s.event(EventSpec::<User>::new("register").handler(|ctx, _args| {
                let target = if ctx.resource().paid {
                    "active.premium"
                } else {
                    "active.default"
                };
                ctx.transition_to(target).map(|_| ())
            }))
        })
        .state("active", |s| {
            s.event(EventSpec::new("ping")).leaf("default").state("premium", |s| {
                s.event(EventSpec::<User>::new("ping").handler(|ctx, _args| {
                    ctx.resource_mut().has_prizes = true;
                    Ok(())
                }))
            })
        })
        .state("inactive", |s| {
            s.behavior(TrackEnterExit)
                .state("banned", |s| {
                    s.behavior(TrackEnterExit)
                        .event(EventSpec::new("appeal").transitions_to("appealing"))
                })
                .state("appealing", |s| s.behavior(TrackEnterExit))
                .event(EventSpec::new("unban").transitions_to("active.default"))
        })
        .build()
        .unwrap()
}

#[test]
fn handler_can_choose_the_target() {
    let mut manager = StateManager::new(user_definition(), User::default()).unwrap();

    manager.resource_mut().paid = true;
    manager.send_event("register", &[]).unwrap();
    assert!(manager.is("active_premium"));

    manager.transition_to("unregistered").unwrap();
    manager.resource_mut().paid = false;
    manager.send_event("register", &[]).unwrap();
    assert!(manager.is("active_default"));
}

#[test]
fn enter_and_exit_run_once_per_change() {
    let mut manager = StateManager::new(user_definition(), User::default()).unwrap();

    manager.transition_to("inactive.banned").unwrap();
    let user = manager.resource();
    assert_eq!((user.entered("inactive"), user.exited("inactive")), (1, 0));
    assert_eq!((user.entered("inactive.banned"), user.exited("inactive.banned")), (1, 0));

    manager.transition_to("unregistered").unwrap();
    let user = manager.resource();
    assert_eq!((user.entered("inactive"), user.exited("inactive")), (1, 1));
    assert_eq!((user.entered("inactive.banned"), user.exited("inactive.banned")), (1, 1));

    manager.transition_to("inactive.banned").unwrap();
    let user = manager.resource();
    assert_eq!((user.entered("inactive"), user.exited("inactive")), (2, 1));
    assert_eq!((user.entered("inactive.banned"), user.exited("inactive.banned")), (2, 1));

    manager.transition_to("inactive.appealing").unwrap();
    let user = manager.resource();
    assert_eq!((user.entered("inactive"), user.exited("inactive")), (2, 1));
    assert_eq!((user.entered("inactive.banned"), user.exited("inactive.banned")), (2, 2));
    assert_eq!((user.entered("inactive.appealing"), user.exited("inactive.appealing")), (1, 0));
}

#[test]
fn event_arguments_reach_the_handler() {
    let mut manager = StateManager::new(user_definition(), User::default()).unwrap();
    manager.send_event("ban", &[json!("brogrammer")]).unwrap();

    assert_eq!(manager.resource().notes.as_deref(), Some("Banned because: brogrammer"));
    assert_eq!(manager.current_path().as_deref(), Some("inactive.banned"));
}

#[test]
fn hooks_see_the_state_before_and_after_the_write() {
    let mut manager =
        StateManager::with_hooks(user_definition(), User::default(), Observed::default()).unwrap();
    manager.send_event("ban", &[]).unwrap();

    let (will_state, will) = manager.hooks().will.clone().unwrap();
    assert_eq!(will_state.as_deref(), Some("unregistered"));
    assert_eq!(will.from.as_deref(), Some("unregistered"));
    assert_eq!(will.to, "inactive.banned");
    assert_eq!(will.event.as_deref(), Some("ban"));

    let (did_state, did) = manager.hooks().did.clone().unwrap();
    assert_eq!(did_state.as_deref(), Some("inactive.banned"));
    assert_eq!(did.from.as_deref(), Some("unregistered"));
    assert_eq!(did.to, "inactive.banned");
    assert_eq!(did.event.as_deref(), Some("ban"));
}

#[test]
fn nearest_declaration_of_an_event_wins() {
    let mut manager = StateManager::new(user_definition(), User::default()).unwrap();

    manager.transition_to("active.default").unwrap();
    manager.send_event("ping", &[]).unwrap();
    assert!(!manager.resource().has_prizes);

    manager.transition_to("premium").unwrap();
    manager.send_event("ping", &[]).unwrap();
    assert!(manager.resource().has_prizes);
}

// Predicates

fn item_definition() -> Arc<Definition<Option<String>>> {
    StateBuilder::new()
        .state("default", |s| {
            s.event(EventSpec::new("do_inner").transitions_to("root.outer1.inner"))
        })
        .state("root", |s| {
            s.state("outer1", |s| {
                s.event(EventSpec::new("next").transitions_to("outer2.inner"))
                    .state("inner", |s| s.event(EventSpec::new("next").transitions_to("inner2")))
                    .leaf("inner2")
            })
            .state("outer2", |s| s.leaf("inner"))
        })
        .build()
        .unwrap()
}

#[test]
fn predicates_track_the_current_state() {
    let mut item = StateManager::new(item_definition(), None).unwrap();

    assert!(item.is("default"));
    assert!(!item.is("root"));
    assert!(!item.is("root_outer1"));
    assert!(!item.is("root_outer1_inner"));
    assert!(item.respond_to_event("do_inner"));
    assert!(!item.respond_to_event("next"));

    item.send_event("do_inner", &[]).unwrap();
    assert!(item.is("root"));
    assert!(item.is("root_outer1"));
    assert!(item.is("root_outer1_inner"));
    assert!(!item.is("root_outer2_inner"));
    assert!(item.respond_to_event("next"));

    item.send_event("next", &[]).unwrap();
    assert!(item.is("root_outer1_inner2"));
    assert!(item.respond_to_event("next"));

    item.send_event("next", &[]).unwrap();
    assert!(item.is("root_outer2_inner"));
    assert!(!item.respond_to_event("next"));
}

// Persistence

#[test]
fn uncommitted_transition_blocks_the_next_one() {
    let hooks = DeferredCommit::new(StateHistory::new());
    let mut manager = StateManager::with_hooks(post_definition(), post(None), hooks).unwrap();
    manager.commit();

    manager.send_event("submit", &[]).unwrap();
    let result = manager.send_event("review", &[]);
    assert_eq!(
        result,
        Err(StateError::DirtyTransition {
            pending: "submitted.awaiting_review".to_string(),
            requested: "submitted.reviewing".to_string(),
        })
    );
    assert_eq!(manager.resource().state.as_deref(), Some("submitted.awaiting_review"));

    manager.commit();
    manager.send_event("review", &[]).unwrap();
    assert_eq!(manager.current_path().as_deref(), Some("submitted.reviewing"));
}

#[test]
fn entered_behavior_runs_after_commit() {
    let mut resource = post(None);
    resource.title = "held".to_string();
    let hooks = DeferredCommit::new(StateHistory::new());
    let mut manager = StateManager::with_hooks(post_definition(), resource, hooks).unwrap();
    manager.commit();

    manager.transition_to("active").unwrap();
    assert_eq!(manager.resource().state.as_deref(), Some("active"));
    assert_eq!(manager.context().get("title"), None);
    assert_eq!(manager.hooks().inner().transitions().len(), 1);

    manager.commit();
    assert_eq!(manager.context().get("title").map(String::as_str), Some("held"));
    assert_eq!(manager.hooks().inner().get_path(), vec!["unsubmitted", "active"]);
}

#[test]
fn checkpoint_restores_into_a_fresh_resource() {
    let mut manager = StateManager::new(post_definition(), post(None)).unwrap();
    manager.send_event("submit", &[]).unwrap();
    manager
        .context_mut()
        .insert("reviewer".to_string(), "kim".to_string());

    let bytes = manager.checkpoint().to_bytes().unwrap();
    let restored = Checkpoint::from_bytes(&bytes)
        .unwrap()
        .restore(post_definition(), post(None), StateHistory::new())
        .unwrap();

    assert_eq!(restored.current_path(), manager.current_path());
    assert_eq!(restored.context(), manager.context());
    assert!(restored.hooks().transitions().is_empty());
}

// Delayed events

#[derive(Debug, Default)]
struct Project {
    state: Option<String>,
    review_hours: u64,
}

impl StateStore for Project {
    fn read_state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    fn write_state(&mut self, path: &str) {
        self.state = Some(path.to_string());
    }
}

fn project_definition() -> Arc<Definition<Project>> {
    StateBuilder::new()
        .state("submitted", |s| {
            s.event(
                EventSpec::new("remind")
                    .transitions_to("reminded")
                    .delay(Duration::from_secs(2 * 60 * 60)),
            )
        })
        .state("reminded", |s| {
            s.event(
                EventSpec::new("auto_accept")
                    .transitions_to("accepted")
                    .delay_with(|project: &Project| {
                        Duration::from_secs(project.review_hours * 60 * 60)
                    }),
            )
        })
        .leaf("accepted")
        .build()
        .unwrap()
}

#[test]
fn delayed_events_fire_in_sequence() {
    let definition = project_definition();
    let hooks = (StateHistory::new(), DelayedEvents::new(Arc::clone(&definition)));
    let project = Project {
        state: None,
        review_hours: 24,
    };
    let mut manager = StateManager::with_hooks(definition, project, hooks).unwrap();
    let start = manager.hooks().0.transitions()[0].timestamp;

    let early = manager.hooks_mut().1.take_due(start + ChronoDuration::hours(1));
    assert!(early.is_empty());

    let due = manager.hooks_mut().1.take_due(start + ChronoDuration::hours(2));
    assert_eq!(deliver_all(&mut manager, due).unwrap(), 1);
    assert_eq!(manager.current_path().as_deref(), Some("reminded"));

    let next = manager.hooks().1.next_due().unwrap();
    let due = manager.hooks_mut().1.take_due(next);
    assert_eq!(deliver_all(&mut manager, due).unwrap(), 1);
    assert_eq!(manager.current_path().as_deref(), Some("accepted"));
    assert_eq!(
        manager.hooks().0.get_path(),
        vec!["submitted", "reminded", "accepted"]
    );
}
