//! Walkthrough of the wiring engine: declared values, the instance
//! behaviours, cycle removal, connectors and deferred wiring.

use std::time::Duration;

use beanwire::{
    BeanSearch, BeanValue, DependencyManager, InjectionError, Initializer, InstanceBehaviour,
    InstanceOptions,
};

/// Externally-constructed configuration entering the registry as a fact.
#[derive(Debug)]
struct AppConfig {
    greeting: &'static str,
    repeat: usize,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .init();

    let mut manager = DependencyManager::new();

    // watch background failures on top of the default log sink
    manager.on_error(|error: &InjectionError| {
        println!("[error channel] {error}");
    });

    // ===== declared values =====
    manager
        .declare(
            "config",
            BeanValue::new(AppConfig {
                greeting: "hello",
                repeat: 3,
            }),
        )
        .expect("fresh identifier");

    match manager.declare("config", BeanValue::new(0_i32)) {
        Err(error) => println!("re-declaring fails: {error}"),
        Ok(()) => unreachable!("the identifier is taken"),
    }

    // ===== cautious wiring, out of registration order =====
    manager
        .instance(
            "greeter",
            Initializer::factory(|mut deps| {
                let config = deps.remove(0).downcast::<AppConfig>()?;
                let banner = deps.remove(0).downcast::<String>()?;
                Ok(BeanValue::new(format!(
                    "{} {}",
                    banner,
                    config.greeting.repeat(config.repeat)
                )))
            }),
            InstanceOptions {
                wiring: vec!["config".into(), "banner".into()],
                ..Default::default()
            },
        )
        .expect("fresh identifier");

    // greeter waits: banner is not there yet
    assert!(manager.wire("greeter").is_err());
    manager
        .declare("banner", BeanValue::new("=>".to_owned()))
        .expect("fresh identifier");

    let greeting = manager.wire("greeter").expect("banner arrived");
    println!("greeter: {}", greeting.downcast::<String>().unwrap());

    // ===== lazy beans initialize on first demand =====
    manager
        .instance(
            "expensive",
            Initializer::constructor(|_| {
                println!("~~building the expensive thing~~");
                Ok(BeanValue::new(451_i32))
            }),
            InstanceOptions {
                behaviour: InstanceBehaviour::Lazy,
                ..Default::default()
            },
        )
        .expect("fresh identifier");
    println!("lazy bean registered, nothing built yet");
    let expensive = manager.wire("expensive").expect("built on demand");
    println!("expensive: {}", expensive.downcast::<i32>().unwrap());

    // ===== a dependency loop is removed, the channel reports it =====
    manager
        .instance(
            "ping",
            Initializer::factory(|_| Ok(BeanValue::new(()))),
            InstanceOptions {
                wiring: vec!["pong".into()],
                ..Default::default()
            },
        )
        .expect("fresh identifier");
    manager
        .instance(
            "pong",
            Initializer::factory(|_| Ok(BeanValue::new(()))),
            InstanceOptions {
                wiring: vec!["ping".into()],
                ..Default::default()
            },
        )
        .expect("fresh identifier");
    assert!(!manager.have_bean("ping") && !manager.have_bean("pong"));

    // ===== connectors fire once their search is satisfiable =====
    manager.auto_wire("late-arrival", |wired| {
        println!(
            "connector fired with: {}",
            wired.downcast::<&str>().map(|v| *v).unwrap_or("<?>")
        );
        Ok(())
    });
    manager
        .declare("late-arrival", BeanValue::new("out-of-order value"))
        .expect("fresh identifier");

    // ===== category wiring =====
    manager
        .declare_in("plugin-a", BeanValue::new("a"), "plugins")
        .expect("fresh identifier");
    manager
        .declare_in("plugin-b", BeanValue::new("b"), "plugins")
        .expect("fresh identifier");
    let plugins = manager
        .wire(BeanSearch::category("plugins"))
        .expect("two ready plugins");
    println!("plugins wired: {}", plugins.many().map_or(0, <[_]>::len));

    // ===== deferred wiring with a timeout =====
    let resolved = manager.async_wire("config", Some(Duration::from_millis(100)));
    let timed_out = manager.async_wire("never-registered", Some(Duration::from_millis(100)));

    match futures::executor::block_on(resolved) {
        Ok(wired) => println!("deferred config: {:?}", wired.downcast::<AppConfig>().unwrap()),
        Err(error) => println!("deferred config failed: {error}"),
    }
    match futures::executor::block_on(timed_out) {
        Ok(_) => unreachable!("nothing ever registers this identifier"),
        Err(error) => println!("deferred wiring failed as expected: {error}"),
    }
}
