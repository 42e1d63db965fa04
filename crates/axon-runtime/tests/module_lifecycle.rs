//! Modules loaded through the runtime against an in-process event source.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axon_core::{EventName, LibraryType, LocalEventSource, ScopeId};
use axon_framework::{Command, CollectorState, Listener, ModuleDescriptor, Registry, RunOptions};
use axon_runtime::{AxonConfig, AxonRuntime, RuntimeError};
use parking_lot::Mutex;
use serde_json::{Value, json};

static CALLS: AtomicUsize = AtomicUsize::new(0);
static SCOPES: Mutex<Vec<Option<String>>> = Mutex::new(Vec::new());

fn record(scope: Option<ScopeId>) {
    SCOPES.lock().push(scope.map(|s| s.as_str().to_string()));
}

fn fun_commands() -> Vec<Command> {
    vec![
        Command::new("roll", |_| async { Ok(()) }).alias("dice"),
        Command::new("flip", |_| async { Ok(()) }),
    ]
}

fn fun_listeners() -> Vec<Listener> {
    vec![Listener::new("counter", EventName::MessageCreate, |_| {
        CALLS.fetch_add(1, Ordering::SeqCst);
        async { Ok(()) }
    })]
}

fn core_listeners() -> Vec<Listener> {
    vec![
        Listener::new("logger", EventName::MessageCreate, |_| async { Ok(()) }),
        Listener::new("scopes", EventName::MessageCreate, |ctx| {
            record(ctx.scope);
            async { Ok(()) }
        }),
    ]
}

fn clashing_listeners() -> Vec<Listener> {
    vec![
        Listener::new("welcome", EventName::GuildMemberAdd, |_| async { Ok(()) }),
        Listener::new("logger", EventName::MessageDelete, |_| async { Ok(()) }),
    ]
}

static FUN: ModuleDescriptor = ModuleDescriptor::new("fun")
    .info("Fun", "games", "Dice and coins")
    .commands(fun_commands)
    .listeners(fun_listeners);

static CORE: ModuleDescriptor = ModuleDescriptor::new("core")
    .server_bypass(true)
    .listeners(core_listeners);

static CLASH: ModuleDescriptor = ModuleDescriptor::new("clash").listeners(clashing_listeners);

fn runtime(library: LibraryType) -> (Arc<LocalEventSource>, AxonRuntime) {
    let source = Arc::new(LocalEventSource::with_user_id("999"));
    let config = AxonConfig {
        library,
        ..AxonConfig::default()
    };
    let runtime = AxonRuntime::from_config(config, source.clone());
    (source, runtime)
}

fn gateway_message(id: &str, guild: Option<&str>) -> Value {
    let mut message = json!({
        "id": id,
        "channel_id": "200",
        "author": {"id": "400", "bot": false},
        "content": "hello",
    });
    if let Some(guild) = guild {
        message["guild_id"] = json!(guild);
    }
    message
}

// Tests share the static counters, so they run as one sequence.
#[tokio::test(start_paused = true)]
async fn test_module_lifecycle() {
    gating_and_bypass().await;
    partial_activation_and_teardown().await;
    cached_library_resolves_nested_scope().await;
    collector_through_runtime().await;
}

async fn gating_and_bypass() {
    CALLS.store(0, Ordering::SeqCst);
    SCOPES.lock().clear();
    let (source, runtime) = runtime(LibraryType::Gateway);

    assert_eq!(runtime.load_modules(&[FUN, CORE]).unwrap(), 2);
    assert_eq!(runtime.module_labels(), ["fun", "core"]);
    assert_eq!(runtime.commands().resolve("dice").unwrap().label(), "roll");
    assert_eq!(runtime.commands().get("roll").unwrap().module(), "fun");
    // three listeners on one event share a single upstream binding
    assert_eq!(source.handler_count("MESSAGE_CREATE"), 1);

    source.emit("MESSAGE_CREATE", gateway_message("1", Some("30")));
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);

    runtime.gate().disable(ScopeId::new("30"), "fun");
    runtime.gate().disable(ScopeId::new("30"), "core");
    source.emit("MESSAGE_CREATE", gateway_message("2", Some("30")));
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);

    // events without a scope are never gated
    source.emit("MESSAGE_CREATE", gateway_message("3", None));
    assert_eq!(CALLS.load(Ordering::SeqCst), 2);

    // core bypasses the gate, so it saw all three
    assert_eq!(
        *SCOPES.lock(),
        [Some("30".to_string()), Some("30".to_string()), None]
    );

    runtime.shutdown();
    assert!(runtime.module_labels().is_empty());
    assert!(runtime.commands().is_empty());
    assert!(runtime.listeners().is_empty());
    assert_eq!(source.subscription_count(), 0);
}

async fn partial_activation_and_teardown() {
    let (source, runtime) = runtime(LibraryType::Gateway);
    runtime.load_module(&CORE).unwrap();

    let err = runtime.load_module(&CLASH).unwrap_err();
    let RuntimeError::Module(err) = err else {
        panic!("expected a module error, got {err:?}");
    };
    assert_eq!(err.module, "clash");
    assert_eq!(err.kind, "listener");
    assert_eq!(err.label, "logger");

    // the partially activated module stays loaded until unloaded
    let clash = runtime.module("clash").unwrap();
    assert_eq!(clash.listener_labels(), ["welcome"]);
    assert_eq!(source.handler_count("GUILD_MEMBER_ADD"), 1);

    runtime.unload_module("clash").unwrap();
    assert_eq!(source.handler_count("GUILD_MEMBER_ADD"), 0);
    assert_eq!(source.handler_count("MESSAGE_CREATE"), 1);
    assert_eq!(runtime.listeners().labels(), ["logger", "scopes"]);

    runtime.shutdown();
    assert_eq!(source.subscription_count(), 0);
}

async fn cached_library_resolves_nested_scope() {
    SCOPES.lock().clear();
    let (source, runtime) = runtime(LibraryType::Cached);
    assert_eq!(runtime.library().library_type(), LibraryType::Cached);
    runtime.load_module(&CORE).unwrap();

    assert_eq!(source.handler_count("MESSAGE_CREATE"), 0);
    source.emit(
        "messageCreate",
        json!({
            "id": "10",
            "channel": {"id": "20", "guild": {"id": "77"}},
            "author": {"id": "40", "bot": false},
            "content": "hi",
        }),
    );
    source.emit("messageCreate", json!({"id": "11", "channel": {"id": "21"}}));

    assert_eq!(*SCOPES.lock(), [Some("77".to_string()), None]);
    runtime.shutdown();
}

async fn collector_through_runtime() {
    let (source, runtime) = runtime(LibraryType::Gateway);
    let collector = Arc::new(runtime.collector());

    let task = tokio::spawn({
        let collector = Arc::clone(&collector);
        async move { collector.run("200", RunOptions::default().count(2)).await }
    });
    while collector.state() != CollectorState::Running {
        tokio::task::yield_now().await;
    }

    // the bot's own messages are ignored
    let mut own = gateway_message("100000000000000001", Some("30"));
    own["author"]["id"] = json!("999");
    source.emit("MESSAGE_CREATE", own);
    source.emit("MESSAGE_CREATE", gateway_message("100000000000000002", Some("30")));
    source.emit("MESSAGE_CREATE", gateway_message("100000000000000003", None));

    let messages = task.await.unwrap().unwrap();
    assert_eq!(
        messages.keys().collect::<Vec<_>>(),
        ["100000000000000002", "100000000000000003"]
    );
    assert_eq!(collector.state(), CollectorState::Ended);
    assert_eq!(source.subscription_count(), 0);
}
