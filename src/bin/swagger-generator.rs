//! Prints the Swagger document of the sample pet store as pretty JSON.

use anyhow::Context;
use swagger_support::{SwaggerConfig, SwaggerSupport, playground};

fn main() -> anyhow::Result<()> {
    let support = SwaggerSupport::install(SwaggerConfig::load());
    playground::router(support.clone()).context("registering documented routes")?;

    let document = support.document().snapshot();
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}
