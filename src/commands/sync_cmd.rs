use aulanet_core::{feed, Collection, Reconciler};

use super::Context;
use crate::config::Config;

/// Forces a full resynchronization from the records service.
pub async fn run_reload(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    // Context::connect already performs the initial load; a second
    // force_reload here exercises the fence the way a UI refresh does.
    let ctx = Context::connect(config).await?;
    ctx.reload.force_reload().await?;

    print_counts(&ctx);
    Ok(())
}

/// Follows the change feed, re-printing collection counts whenever the
/// replica changes. Runs until Ctrl-C or the server closes the feed.
pub async fn run_watch(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let (server_url, api_key) = config.require_connection()?;
    let ctx = Context::connect(config).await?;

    let (handle, events) = feed::subscribe(&server_url, &api_key).await?;
    let reconciler = Reconciler::new(ctx.store.clone());
    let mut feed_task = tokio::spawn(reconciler.run(events));

    let mut changes = ctx.store.subscribe();
    print_counts(&ctx);

    loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                print_counts(&ctx);
            }
            _ = &mut feed_task => {
                println!("Feed closed by server");
                return Ok(());
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    handle.close();
    Ok(())
}

fn print_counts(ctx: &Context) {
    let (people, offerings, enrollments) = ctx.store.read(|s| {
        (
            s.len(Collection::People),
            s.len(Collection::Offerings),
            s.len(Collection::Enrollments),
        )
    });
    println!(
        "{} people, {} offerings, {} enrollments",
        people, offerings, enrollments
    );
}
