use scriptstage_core::{Configuration, PluginRequest};

use crate::report::{AnalysisReport, ScriptReport};

pub fn print_report(report: &AnalysisReport) {
    if let Some(config_file) = &report.config_file {
        println!("⚙️  Config: {}", config_file.display());
    }
    if report.scripts.is_empty() {
        println!("No scripts found");
    }

    for script in &report.scripts {
        print_script(script);
    }

    if !report.plugin_repositories.is_empty() {
        println!("\n🗄️  Plugin repositories:");
        for repository in &report.plugin_repositories {
            println!("   - {:?} {}", repository.kind, repository.url);
        }
    }

    println!(
        "\n📊 Compile cache: {} hits, {} misses, {} entries",
        report.cache.hits, report.cache.misses, report.cache.entries
    );
}

fn print_script(script: &ScriptReport) {
    println!("\n🔍 Script: {}", script.path.display());
    println!("{}", "=".repeat(80));
    println!("   🎯 Target: {}", script.target);
    println!(
        "   🧭 Passes: {} → {}",
        script.outcome.initial_kind, script.outcome.final_kind
    );

    if script.outcome.plugin_requests.is_empty() {
        println!("   🔌 Plugin requests: none");
    } else {
        println!("   🔌 Plugin requests:");
        for request in &script.outcome.plugin_requests {
            println!("      - {}", format_request(request));
        }
    }

    print_list("📦 Script classpath", &script.script_classpath);
    print_list("🗄️  Script repositories", &script.script_repositories);
    let scope: Vec<String> = script.scope_classpath.iter().map(|e| e.to_string()).collect();
    print_list("🧩 Scope classpath", &scope);

    if script.outcome.script_attached {
        println!("   🧬 Methods: {}", script.methods.join(", "));
    }

    let statements: Vec<String> = script
        .evaluated
        .iter()
        .map(|s| format!("line {}: {}", s.line, s.head))
        .collect();
    print_list("▶️  Evaluated", &statements);

    println!("   ✅ Configuration: {}", describe(script.outcome.configuration));
}

fn print_list(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("   {title}:");
    for item in items {
        println!("      - {item}");
    }
}

fn format_request(request: &PluginRequest) -> String {
    match request.location() {
        Some(location) => format!("{request} at {location}"),
        None => request.to_string(),
    }
}

pub fn describe(configuration: Configuration) -> &'static str {
    match configuration {
        Configuration::Skipped => "nothing to run",
        Configuration::Submitted { may_defer: true } => "deferred until the target is configured",
        Configuration::Submitted { may_defer: false } => "run immediately",
    }
}
