use console::Style;
use somata_core::pipeline::{PipelineConfig, PipelineOutput};
use somata_core::template::TemplateLibrary;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_detection_summary(config: &PipelineConfig) {
    let s = Styles::new();
    let d = &config.detection;

    println!();
    println!("  {}", s.title.apply_to("Somata Cell Detection"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(21)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Input"),
        s.path.apply_to(config.input.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Format"),
        s.method.apply_to(&config.input_format)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(config.output.display())
    );
    println!();

    println!("  {}", s.header.apply_to("Search"));
    println!(
        "    {:<14}{}",
        s.label.apply_to("Templates"),
        s.value.apply_to(format!("{:?}", d.template_radii))
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("Dilation"),
        s.value.apply_to(d.dilation_size)
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("Threshold"),
        s.value.apply_to(d.probability_threshold)
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("Stop at"),
        s.value.apply_to(d.stopping_criterion)
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("Max cells"),
        s.value.apply_to(d.max_cells)
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("Correlation"),
        s.method.apply_to(d.correlation)
    );
    println!();

    if config.label_slices {
        println!(
            "  {:<14}{}",
            s.header.apply_to("Label slices"),
            s.value.apply_to("enabled")
        );
    } else {
        println!(
            "  {:<14}{}",
            s.header.apply_to("Label slices"),
            s.disabled.apply_to("disabled")
        );
    }
    println!();
}

pub fn print_detection_result(output: &PipelineOutput) {
    let s = Styles::new();
    let det = &output.detections;

    println!();
    println!("  {}", s.header.apply_to("Result"));
    println!(
        "    {:<14}{}",
        s.label.apply_to("Cells"),
        s.value.apply_to(det.len())
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("Stopped"),
        s.method.apply_to(det.termination)
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("Correlation"),
        s.method.apply_to(output.method)
    );
    if let Some(last) = det.centroids.last() {
        println!(
            "    {:<14}{}",
            s.label.apply_to("Last conf."),
            s.value.apply_to(format!("{:.4}", last.confidence))
        );
    }
    println!(
        "    {:<14}{}",
        s.label.apply_to("Centroids"),
        s.path.apply_to(output.centroids_path.display())
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("Labels"),
        s.path.apply_to(output.labels_path.display())
    );
    if let Some(ref dir) = output.label_slices_dir {
        println!(
            "    {:<14}{}",
            s.label.apply_to("Label slices"),
            s.path.apply_to(dir.display())
        );
    }
    println!();
}

pub fn print_template_libraries(detect: &TemplateLibrary, suppress: &TemplateLibrary) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Template Libraries"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(18)));
    println!();
    println!(
        "  {:<14}{}",
        s.label.apply_to("Box"),
        s.value.apply_to(format!(
            "{0}x{0}x{0} (radius {1})",
            detect.box_length(),
            detect.box_radius()
        ))
    );
    println!();

    for (title, library) in [("Detection", detect), ("Suppression", suppress)] {
        println!("  {}", s.header.apply_to(title));
        for (i, t) in library.iter().enumerate() {
            println!(
                "    {}. {:<10}{}",
                s.label.apply_to(i + 1),
                s.method.apply_to(format!("size {}", t.radius())),
                s.value.apply_to(format!(
                    "{} voxels, norm {:.4}",
                    t.voxel_count(),
                    t.norm()
                ))
            );
        }
        println!();
    }
}
