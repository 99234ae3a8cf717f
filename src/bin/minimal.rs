// Minimal smoke run of the band pipeline on a synthetic gradient

use luma_grain::{
    config::Config,
    grain::GrainerConfig,
    graigasm::GrainingOptions,
    video::{Frame, Plane, VideoFormat},
    GrainerRegistry,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🎬 Testing luma-grain core functionality");

    // Test 1: Grainer Registry
    println!("\n1. Testing Grainer Registry...");
    let registry = GrainerRegistry::new();
    let available = registry.available_grainers();
    println!("   Available grainers: {:?}", available);
    assert_eq!(available.len(), 3);

    for name in &available {
        let grainer = registry.create(&GrainerConfig::named(name.as_str()))?;
        let metadata = grainer.metadata();
        println!("   {}: {}", grainer.name(), grainer.description());
        println!(
            "      Performance impact: {}, deterministic: {}",
            metadata.performance_impact, metadata.deterministic
        );
        for (parameter, help) in &metadata.optional_parameters {
            println!("      {} - {}", parameter, help);
        }
    }

    // Test 2: Default configuration
    println!("\n2. Testing Configuration...");
    let config = Config::default();
    let graigasm = config.build_graigasm(&registry)?;
    for band in graigasm.bands() {
        println!(
            "   threshold {:>5} strength {:?} size {} sharp {} overflow {}",
            band.threshold, band.strength, band.size, band.sharp, band.overflow
        );
    }

    // Test 3: Frame Creation
    println!("\n3. Testing Frame Creation...");
    let format = VideoFormat::yuv(8, 1, 1);
    let (width, height) = (320, 180);
    let (cw, ch) = format.plane_size(1, width, height);
    let frame = Frame::from_planes(
        format,
        vec![
            Plane::from_fn(width, height, |x, _| (x * 255 / (width - 1)) as f32),
            Plane::new_filled(cw, ch, 128.0),
            Plane::new_filled(cw, ch, 128.0),
        ],
    )?;
    println!("   Created frame: {}x{}", frame.width(), frame.height());

    // Test 4: Masks
    println!("\n4. Testing Band Masks...");
    let previews = graigasm.show_masks(&frame, None)?;
    for preview in &previews {
        let weight: f32 = preview.mask.plane(0).map(|p| p.samples().iter().sum()).unwrap_or(0.0);
        println!("   {} (total weight {:.0})", preview.label, weight);
    }

    // Test 5: Graining
    println!("\n5. Testing Graining...");
    let grained = graigasm.graining(&frame, GrainingOptions::default())?;
    match grained {
        luma_grain::graigasm::GrainingOutput::Frame(out) => {
            let changed = out.planes()[0]
                .samples()
                .iter()
                .zip(frame.planes()[0].samples())
                .filter(|(a, b)| a != b)
                .count();
            println!("   ✅ Grain applied, {} luma samples changed", changed);
        }
        luma_grain::graigasm::GrainingOutput::Masks(_) => return Err("unexpected mask output".into()),
    }

    println!("\n🎉 All checks passed!");
    Ok(())
}
