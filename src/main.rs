use std::error::Error;
use std::fs;
use std::sync::Arc;

use clap::Parser;
use log::{error, info};

use distributed_raytracer::distributed::executor::{LocalCluster, RenderJob};
use distributed_raytracer::distributed::output::BitmapSink;
use distributed_raytracer::distributed::TileOptions;
use distributed_raytracer::logger::init_logger;
use distributed_raytracer::RenderError;
use distributed_raytracer::raytracing::parser::{
    demo_scene, SceneDescription, SceneParser, DEFAULT_ITERATIONS,
};

mod cli;
use cli::Args;

fn load_scene(args: &Args) -> Result<SceneDescription, Box<dyn Error>> {
    let Some(path) = &args.scene else {
        info!("no scene file given, rendering the demo scene");
        return Ok(demo_scene(args.size, args.size, DEFAULT_ITERATIONS));
    };
    let content = fs::read_to_string(path)?;
    match SceneParser::new(&content).parse_scene() {
        Ok(description) => Ok(description),
        Err(parser_error) => {
            error!("{}", parser_error.error_location(&content));
            Err(RenderError::from(parser_error).into())
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logger(args.log_level.into());

    let SceneDescription { camera, mut scene } = load_scene(&args)?;
    if let Some(iterations) = args.iterations {
        scene.set_iterations(iterations);
    }
    info!(
        "{} objects, {} lights, reflection depth {}",
        scene.objects().len(),
        scene.lights().len(),
        scene.iterations()
    );

    fs::create_dir_all(&args.output_dir)?;
    let sink = BitmapSink::new(&args.output_dir);
    let job = RenderJob {
        fragments_per_node: args.fragments,
        options: TileOptions {
            preview_width: args.preview_width,
            save_partial: args.partials,
        },
        artifact: args.output.clone(),
        ..RenderJob::new(camera, Arc::new(scene))
    };

    let image = LocalCluster::new(args.nodes)?.run(&job, &sink)?;
    info!(
        "wrote {} ({}x{})",
        args.output,
        image.width(),
        image.height()
    );
    Ok(())
}
