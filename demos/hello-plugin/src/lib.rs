//! A minimal shared-library plugin.
//!
//! Registers a `Hello` handler and a `Greeting` export. Its `OnInit` appends
//! one line to the file named by `HELLO_INIT_LOG` when that variable is set.

use plugserve::plugin::api::{
    BoxError, Environment, Flags, PluginRegistrar, Plugins, Response, StatusCode,
};
use std::io::Write;

const INIT_LOG_VAR: &str = "HELLO_INIT_LOG";

fn register(registrar: &mut PluginRegistrar) {
    registrar
        .handler("Hello", |ctx| {
            let who = ctx.param("name").unwrap_or("world").to_string();
            Some(Response::text(StatusCode::OK, format!("hello, {}", who)))
        })
        .export("Greeting", "hello".to_string());
}

fn setup(_: &dyn Plugins, flags: &Flags, env: &Environment) -> Result<(), BoxError> {
    let Some(path) = env.get(INIT_LOG_VAR) else {
        return Ok(());
    };
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(
        file,
        "init greeting={}",
        flags.get("greeting").map(String::as_str).unwrap_or("none")
    )?;
    Ok(())
}

plugserve::declare_plugin!(register);
plugserve::declare_on_init!(flags_and_env: setup);
