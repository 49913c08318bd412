//! DXFGuard CLI - DXF drawing analysis from the command line.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use dxfguard::ai::{prepare_data_for_ai, AIRouter, PromptType};
use dxfguard::manufacturing::cost::CustomerInfo;
use dxfguard::report::{self, ai_context_path};
use dxfguard::{
    compare_drawings, parse_drawing, AnalysisOptions, AnalysisResult, AutoFixer, CheckResult,
    CncAnalyzer, CostEstimator, DxfGuardConfig, DxfGuardCore, Issue, MaterialSpec, RulesEngine,
    Severity,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dxfguard")]
#[command(about = "DXF drawing analysis, CNC and cost estimation tool", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./dxfguard.json when present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a drawing and write a report
    Analyze {
        /// Path to .dxf file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Report path (defaults to <stem>_analysis.md or .json next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Report format
        #[arg(short, long, value_enum, default_value = "markdown")]
        format: ReportFormat,

        /// Skip the advanced analysis section
        #[arg(long)]
        basic: bool,
    },

    /// Run the rule checks on a single drawing
    Check {
        /// Path to .dxf file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Exit with error code if issues found at this severity or higher
        #[arg(long, value_enum)]
        fail_on: Option<FailOnSeverity>,

        /// Only run these rule ids (comma separated)
        #[arg(long, value_delimiter = ',')]
        rules: Vec<String>,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },

    /// Check all DXF files in a directory
    Project {
        /// Path to project directory
        #[arg(value_name = "DIR", default_value = ".")]
        dir: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Exit with error code if issues found at this severity or higher
        #[arg(long, value_enum)]
        fail_on: Option<FailOnSeverity>,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },

    /// Compare two revisions of a drawing
    Compare {
        #[arg(value_name = "OLD")]
        old: PathBuf,

        #[arg(value_name = "NEW")]
        new: PathBuf,

        #[arg(short, long, value_enum, default_value = "markdown")]
        format: ReportFormat,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// CNC machinability analysis
    Cnc {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// aluminum, steel, stainless_steel or titanium
        #[arg(short, long)]
        material: Option<String>,

        #[arg(short, long, value_enum, default_value = "markdown")]
        format: ReportFormat,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manufacturing cost estimate and quotation
    Cost {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// aluminum, steel, stainless_steel, titanium or plastic
        #[arg(short, long)]
        material: Option<String>,

        /// Material grade (defaults to the material's first grade)
        #[arg(long)]
        grade: Option<String>,

        /// Stock thickness in mm
        #[arg(long, default_value_t = 10.0)]
        thickness: f64,

        /// 3axis_mill, 5axis_mill, lathe, edm or laser
        #[arg(long)]
        machine: Option<String>,

        /// Production quantity
        #[arg(long, default_value_t = 1)]
        qty: u32,

        /// Print a quotation instead of the cost report
        #[arg(long)]
        quote: bool,

        #[arg(long)]
        company: Option<String>,

        #[arg(long)]
        contact: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        product: Option<String>,

        #[arg(short, long, value_enum, default_value = "markdown")]
        format: ReportFormat,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Apply automatic fixes and save the result
    Fix {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Fixed drawing path (defaults to <stem>_fixed.dxf)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not copy the input to a timestamped backup first
        #[arg(long)]
        no_backup: bool,
    },

    /// Ask an AI provider to review the drawing
    Ai {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// openai, claude, gemini or all (defaults to the preferred provider)
        #[arg(short, long)]
        provider: Option<String>,

        /// analysis, comparison, autofix, design_review, cnc_analysis or cost_estimation
        #[arg(long, default_value = "analysis")]
        prompt: String,

        /// Second drawing for the comparison prompt
        #[arg(long, value_name = "FILE")]
        against: Option<PathBuf>,

        /// Ask a free-form question instead of running a prompt
        #[arg(short, long)]
        question: Option<String>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write the sample drawing
    Sample {
        #[arg(value_name = "OUT", default_value = "sample.dxf")]
        out: PathBuf,
    },

    /// List available rules (use -v for descriptions)
    Rules,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for CI/CD
    Json,
    /// GitHub Actions format
    Github,
    /// GitLab CI format
    Gitlab,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    Markdown,
    Json,
}

impl ReportFormat {
    fn extension(self) -> &'static str {
        match self {
            ReportFormat::Markdown => "md",
            ReportFormat::Json => "json",
        }
    }
}

#[derive(Clone, ValueEnum)]
enum FailOnSeverity {
    Error,
    Warning,
    Info,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };

    process::exit(exit_code);
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let config = DxfGuardConfig::load(cli.config.as_deref())?;
    tracing::debug!(
        "Configuration loaded (preferred provider: {:?})",
        config.preferred_provider
    );

    match cli.command {
        Commands::Analyze {
            file,
            output,
            format,
            basic,
        } => handle_analyze(&file, output, format, basic),
        Commands::Check {
            file,
            format,
            fail_on,
            rules,
            strict,
        } => {
            let options = AnalysisOptions {
                rules,
                strict_mode: strict,
            };
            handle_check(&file, format, fail_on, &options)
        }
        Commands::Project {
            dir,
            format,
            fail_on,
            strict,
        } => {
            let options = AnalysisOptions {
                rules: Vec::new(),
                strict_mode: strict,
            };
            handle_project(&dir, format, fail_on, &options)
        }
        Commands::Compare {
            old,
            new,
            format,
            output,
        } => handle_compare(&old, &new, format, output.as_deref()),
        Commands::Cnc {
            file,
            material,
            format,
            output,
        } => {
            let material = material.unwrap_or_else(|| config.default_material.clone());
            handle_cnc(&file, &material, format, output.as_deref())
        }
        Commands::Cost {
            file,
            material,
            grade,
            thickness,
            machine,
            qty,
            quote,
            company,
            contact,
            phone,
            product,
            format,
            output,
        } => {
            let spec = MaterialSpec::parse(
                material.as_deref().unwrap_or(&config.default_material),
                grade.as_deref(),
                thickness,
                machine.as_deref().unwrap_or(&config.default_machine),
            )?;
            let customer = quote.then(|| CustomerInfo {
                company,
                contact,
                phone,
                product_name: product,
            });
            handle_cost(&file, &spec, qty, customer.as_ref(), format, output.as_deref())
        }
        Commands::Fix {
            file,
            output,
            no_backup,
        } => handle_fix(&file, output, no_backup, config.min_text_height),
        Commands::Ai {
            file,
            provider,
            prompt,
            against,
            question,
            output,
        } => {
            let request = AiRequest {
                provider,
                prompt: prompt.parse()?,
                against,
                question,
            };
            handle_ai(&file, &request, &config, output.as_deref())
        }
        Commands::Sample { out } => {
            dxfguard::sample::write_sample(&out)?;
            println!("Sample drawing written to {}", out.display());
            Ok(0)
        }
        Commands::Rules => {
            handle_rules(cli.verbose);
            Ok(0)
        }
    }
}

fn default_output(file: &Path, suffix: &str, extension: &str) -> PathBuf {
    let stem = file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("drawing");
    file.with_file_name(format!("{}_{}.{}", stem, suffix, extension))
}

/// Write to `output` when given, otherwise print.
fn emit(content: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Report written to {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

fn handle_analyze(
    file: &Path,
    output: Option<PathBuf>,
    format: ReportFormat,
    basic: bool,
) -> anyhow::Result<i32> {
    let output = output.unwrap_or_else(|| default_output(file, "analysis", format.extension()));
    let result = DxfGuardCore::analyze_file(file)?;

    let content = match (format, basic) {
        (ReportFormat::Markdown, true) => report::basic_report(&result.drawing),
        (ReportFormat::Markdown, false) => {
            report::advanced_report(&result.drawing, &result.advanced, &result.three_d)
        }
        (ReportFormat::Json, true) => report::to_json(&result.drawing)?,
        (ReportFormat::Json, false) => report::to_json(&result)?,
    };
    std::fs::write(&output, content)
        .with_context(|| format!("failed to write {}", output.display()))?;

    print_analysis_summary(&result);
    println!("\nReport written to {}", output.display());

    if matches!(format, ReportFormat::Markdown) && !basic {
        let context_path = ai_context_path(&output);
        let context = prepare_data_for_ai(&result.drawing, Some(&result.advanced));
        report::write_json(&context, &context_path)?;
        println!("AI context written to {}", context_path.display());
    }
    Ok(0)
}

fn print_analysis_summary(result: &AnalysisResult) {
    let summary = &result.drawing.summary_info;
    let advanced = &result.advanced.summary;

    println!("\nFile: {}", result.file.display());
    println!("{}", "─".repeat(60));
    println!("  Entities:    {}", summary.total_entities);
    println!("  Layers:      {}", summary.layer_count);
    println!("  Dimensions:  {}", summary.dimension_count);
    println!("  Circles/arcs: {}", summary.circle_count + summary.arc_count);
    println!("  Texts:       {}", summary.text_count);
    println!(
        "  Quality:     {:.1} ({} - {})",
        advanced.quality_score,
        advanced.quality_grade,
        advanced.quality_grade.label()
    );
    println!("  Complexity:  {}", advanced.complexity_level);
    println!(
        "  Standards:   {}",
        if advanced.standards_compliant {
            "ISO compliant"
        } else {
            "not ISO compliant"
        }
    );
    if result.three_d.is_3d {
        println!("  3D:          {}", result.three_d.complexity);
    }
}

fn handle_check(
    file: &Path,
    format: OutputFormat,
    fail_on: Option<FailOnSeverity>,
    options: &AnalysisOptions,
) -> anyhow::Result<i32> {
    let result = DxfGuardCore::check_file(file, options)?;
    output_results(std::slice::from_ref(&result), &format)?;
    Ok(match fail_on {
        Some(severity) if should_fail(&result, &severity) => 1,
        _ => 0,
    })
}

fn handle_project(
    dir: &Path,
    format: OutputFormat,
    fail_on: Option<FailOnSeverity>,
    options: &AnalysisOptions,
) -> anyhow::Result<i32> {
    let results = DxfGuardCore::check_project(dir, options)?;
    output_results(&results, &format)?;
    if let Some(severity) = fail_on {
        if results.iter().any(|r| should_fail(r, &severity)) {
            return Ok(1);
        }
    }
    Ok(0)
}

fn should_fail(result: &CheckResult, severity: &FailOnSeverity) -> bool {
    match severity {
        FailOnSeverity::Error => result.has_errors(),
        FailOnSeverity::Warning => result.has_warnings_or_errors(),
        FailOnSeverity::Info => result.total_issues() > 0,
    }
}

fn output_results(results: &[CheckResult], format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Human => output_human(results),
        OutputFormat::Json => output_json(results)?,
        OutputFormat::Github => output_github(results),
        OutputFormat::Gitlab => output_gitlab(results)?,
    }
    Ok(())
}

fn output_human(results: &[CheckResult]) {
    for result in results {
        println!("\nFile: {}", result.file.display());
        println!("{}", "─".repeat(60));

        if result.total_issues() == 0 {
            println!("  No issues found");
            continue;
        }

        for (label, severity) in [
            ("ERROR", Severity::Error),
            ("WARNING", Severity::Warning),
            ("INFO", Severity::Info),
        ] {
            let issues: Vec<&Issue> = result
                .issues
                .iter()
                .filter(|i| i.severity == severity)
                .collect();
            if issues.is_empty() {
                continue;
            }
            println!("\n  {}:", label);
            for issue in issues {
                println!("    - [{}] {}", issue.rule_id, issue.message);
                if let Some(ref layer) = issue.layer {
                    println!("      Layer: {}", layer);
                }
                if let Some(ref suggestion) = issue.suggestion {
                    println!("      Suggestion: {}", suggestion);
                }
            }
        }

        println!("\n  Summary:");
        println!("    Errors:   {}", result.stats.errors);
        println!("    Warnings: {}", result.stats.warnings);
        println!("    Info:     {}", result.stats.info);
    }
}

fn output_json(results: &[CheckResult]) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "results": results,
        "summary": {
            "total_files": results.len(),
            "total_issues": results.iter().map(|r| r.total_issues()).sum::<usize>(),
            "errors": results.iter().map(|r| r.stats.errors).sum::<usize>(),
            "warnings": results.iter().map(|r| r.stats.warnings).sum::<usize>(),
        }
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn severity_to_github(issue: &Issue) -> &'static str {
    match issue.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "notice",
    }
}

fn output_github(results: &[CheckResult]) {
    for result in results {
        for issue in &result.issues {
            println!(
                "::{} file={}::{}",
                severity_to_github(issue),
                result.file.display(),
                issue.message.replace('\n', " ")
            );
        }
    }
}

fn severity_to_gitlab(issue: &Issue) -> &'static str {
    match issue.severity {
        Severity::Error => "blocker",
        Severity::Warning => "major",
        Severity::Info => "info",
    }
}

fn output_gitlab(results: &[CheckResult]) -> anyhow::Result<()> {
    let mut reports = Vec::new();
    for result in results {
        for issue in &result.issues {
            reports.push(serde_json::json!({
                "description": issue.message,
                "check_name": issue.rule_id,
                "fingerprint": issue.id,
                "severity": severity_to_gitlab(issue),
                "location": {
                    "path": result.file.display().to_string(),
                }
            }));
        }
    }
    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}

fn handle_compare(
    old: &Path,
    new: &Path,
    format: ReportFormat,
    output: Option<&Path>,
) -> anyhow::Result<i32> {
    let old_data = parse_drawing(old)?;
    let new_data = parse_drawing(new)?;
    let result = compare_drawings(&old_data, &new_data);

    let content = match format {
        ReportFormat::Markdown => report::comparison_report(&result),
        ReportFormat::Json => report::to_json(&result)?,
    };
    emit(&content, output)?;
    Ok(0)
}

fn handle_cnc(
    file: &Path,
    material: &str,
    format: ReportFormat,
    output: Option<&Path>,
) -> anyhow::Result<i32> {
    let analyzer = CncAnalyzer::for_material(material)?;
    let drawing = parse_drawing(file)?;
    let analysis = analyzer.analyze(&drawing);

    let content = match format {
        ReportFormat::Markdown => report::cnc_report(&analysis),
        ReportFormat::Json => report::to_json(&analysis)?,
    };
    emit(&content, output)?;
    Ok(0)
}

fn handle_cost(
    file: &Path,
    spec: &MaterialSpec,
    quantity: u32,
    customer: Option<&CustomerInfo>,
    format: ReportFormat,
    output: Option<&Path>,
) -> anyhow::Result<i32> {
    let drawing = parse_drawing(file)?;
    let estimate = CostEstimator::estimate(&drawing, spec, quantity)?;

    let content = match (customer, format) {
        (Some(customer), _) => CostEstimator::quotation(&estimate, customer),
        (None, ReportFormat::Markdown) => report::cost_report(&estimate),
        (None, ReportFormat::Json) => report::to_json(&estimate)?,
    };
    emit(&content, output)?;
    Ok(0)
}

fn handle_fix(
    file: &Path,
    output: Option<PathBuf>,
    no_backup: bool,
    min_text_height: f64,
) -> anyhow::Result<i32> {
    let output = output.unwrap_or_else(|| default_output(file, "fixed", "dxf"));
    let mut fixer = AutoFixer::load(file)?.with_min_text_height(min_text_height);

    if !no_backup {
        let backup = fixer.create_backup(file)?;
        println!("Backup written to {}", backup.display());
    }

    let fix_report = fixer.fix_with_analysis();
    fixer.save(&output)?;

    println!("{}", report::autofix_report(&fix_report));
    println!("Fixed drawing written to {}", output.display());
    Ok(0)
}

struct AiRequest {
    provider: Option<String>,
    prompt: PromptType,
    against: Option<PathBuf>,
    question: Option<String>,
}

fn ai_data(
    file: &Path,
    request: &AiRequest,
    config: &DxfGuardConfig,
) -> anyhow::Result<serde_json::Value> {
    let result = DxfGuardCore::analyze_file(file)?;
    let mut data = serde_json::to_value(prepare_data_for_ai(&result.drawing, Some(&result.advanced)))?;

    match request.prompt {
        PromptType::Comparison => {
            let Some(other) = &request.against else {
                bail!("the comparison prompt needs --against <FILE>");
            };
            let other = parse_drawing(other)?;
            data["comparison"] = serde_json::to_value(compare_drawings(&result.drawing, &other))?;
        }
        PromptType::CncAnalysis => {
            let analysis = CncAnalyzer::for_material(&config.default_material)?.analyze(&result.drawing);
            data["cnc"] = serde_json::to_value(analysis)?;
        }
        PromptType::CostEstimation => {
            let spec = MaterialSpec::parse(&config.default_material, None, 10.0, &config.default_machine)?;
            data["cost"] = serde_json::to_value(CostEstimator::estimate(&result.drawing, &spec, 1)?)?;
        }
        PromptType::Autofix => {
            data["quality_issues"] = serde_json::to_value(&result.advanced.quality_analysis.issues)?;
            data["anomalies"] = serde_json::to_value(&result.advanced.anomalies)?;
        }
        PromptType::Analysis | PromptType::DesignReview => {}
    }
    Ok(data)
}

fn handle_ai(
    file: &Path,
    request: &AiRequest,
    config: &DxfGuardConfig,
    output: Option<&Path>,
) -> anyhow::Result<i32> {
    let router = AIRouter::from_config(config);
    if !router.has_provider() {
        bail!("no AI provider configured; set OPENAI_API_KEY, ANTHROPIC_API_KEY or GOOGLE_API_KEY");
    }
    let data = ai_data(file, request, config)?;

    let runtime = tokio::runtime::Runtime::new()?;
    let content = runtime.block_on(async {
        if let Some(question) = &request.question {
            return anyhow::Ok(router.chat(question, &data).await?);
        }
        match request.provider.as_deref() {
            Some(p) if p.eq_ignore_ascii_case("all") => {
                let combined = router.analyze_with_all(request.prompt, &data).await?;
                Ok(report::combined_ai_report(&combined))
            }
            provider => {
                let analysis = router.analyze(provider, request.prompt, &data).await?;
                Ok(report::ai_report(&analysis))
            }
        }
    })?;

    emit(&content, output)?;
    Ok(0)
}

fn handle_rules(verbose: bool) {
    println!("Available rules:\n");

    let engine = RulesEngine::with_default_rules();
    for rule in engine.rules() {
        println!("  {}", rule.id());
        println!("    {} [{}]", rule.name(), rule.severity());
        if verbose {
            println!("    {}", rule.description());
        }
        println!();
    }
}
