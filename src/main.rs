use anyhow::Result;

mod assets;
mod atmosphere;
mod audio;
mod camera;
mod config;
mod engine;
mod environment;
mod lightning;
mod lights;
mod math;
mod model;
mod particles;
mod picking;
mod rendering;
mod scene_graph;
mod state;
mod window;

fn main() -> Result<()> {
    pretty_env_logger::init();

    pollster::block_on(window::run())?;

    Ok(())
}
