use map_gestures::app::App;
use tracing_subscriber::EnvFilter;
use winit::event_loop::{ControlFlow, EventLoop};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let event_loop = EventLoop::new()?;
    // Redraws are requested only while a gesture or animation needs them
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::from_env()?;
    event_loop.run_app(&mut app)?;

    Ok(())
}
