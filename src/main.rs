use anyhow::{Context, Result};
use clap::Parser;
use form_fill_rust::{cache, cli, config, export, loader, report, session};
use cli::{Cli, Commands};
use config::Config;
use indicatif::{ProgressBar, ProgressStyle};
use session::Session;
use std::path::{Path, PathBuf};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load().context("設定ファイルを読み込めません")?;
    let effective = effective_config(&cli, &config);
    let sheet = effective.default_sheet.clone();

    match cli.command {
        Commands::Scan { template, json } => {
            let session = Session::new(&effective)?.with_cache(!cli.no_cache);
            let loaded = session
                .open_template(&template, sheet.as_deref())
                .with_context(|| format!("テンプレート: {}", template.display()))?;

            if json {
                let scan = report::scan_report(
                    &template,
                    loaded.spreadsheet.name(),
                    &loaded.registry,
                    &loaded.diagnostics,
                    loaded.from_cache,
                );
                println!("{}", report::to_json(&scan)?);
                return Ok(());
            }

            println!("📋 form-fill - テンプレート走査\n");
            println!(
                "✔ シート '{}' を走査{}\n",
                loaded.spreadsheet.name(),
                if loaded.from_cache { " (キャッシュ)" } else { "" }
            );
            report::print_registry(&loaded.registry);
            report::print_diagnostics(&loaded.diagnostics);
        }

        Commands::Map { template, data, data_sheet, json } => {
            let session = Session::new(&effective)?.with_cache(!cli.no_cache);
            let loaded = session
                .open_template(&template, sheet.as_deref())
                .with_context(|| format!("テンプレート: {}", template.display()))?;
            let table = loader::load_data_table(&data, data_sheet.as_deref())
                .with_context(|| format!("データ: {}", data.display()))?;

            let mut diagnostics = loaded.diagnostics.clone();
            let mappings = session.filler().map(&loaded.registry, &table, &mut diagnostics);

            if json {
                let map = report::MapReport {
                    strategy: session.strategy_name(),
                    threshold: session.threshold(),
                    mappings: &mappings,
                    diagnostics: &diagnostics,
                };
                println!("{}", report::to_json(&map)?);
                return Ok(());
            }

            println!("🔗 form-fill - 項目照合\n");
            println!(
                "戦略: {} / 閾値: {}\n",
                session.strategy_name(),
                session.threshold()
            );
            report::print_mappings(&mappings);
            report::print_diagnostics(&diagnostics);
        }

        Commands::Fill { template, data, row, output, data_sheet, report: report_path } => {
            println!("📝 form-fill - 転記\n");
            let session = Session::new(&effective)?.with_cache(!cli.no_cache);

            println!("[1/3] テンプレートを読み込み中...");
            let loaded = session
                .open_template(&template, sheet.as_deref())
                .with_context(|| format!("テンプレート: {}", template.display()))?;
            println!("✔ {}項目を検出\n", loaded.registry.fields().count());

            println!("[2/3] データを読み込み中...");
            let table = loader::load_data_table(&data, data_sheet.as_deref())
                .with_context(|| format!("データ: {}", data.display()))?;
            println!("✔ {}列 × {}行\n", table.column_names().len(), table.row_count());

            println!("[3/3] 転記中... (行 {})", row);
            let mut outcome = session
                .filler()
                .fill(&loaded.spreadsheet, &loaded.registry, &table, row)?;
            let mut diagnostics = loaded.diagnostics.clone();
            diagnostics.extend(std::mem::take(&mut outcome.diagnostics));

            let output_path = export::fill_output_path(
                &template,
                output.as_deref(),
                outcome.writes.first().map(|w| w.value.as_str()),
                row,
            );
            export::save_spreadsheet(&outcome.spreadsheet, &output_path)?;
            report::print_writes(&outcome.writes);
            println!(
                "✔ {}項目を転記: {}",
                outcome.filled_count,
                output_path.display()
            );
            report::print_diagnostics(&diagnostics);

            if let Some(report_path) = report_path {
                let fill = report::FillReport {
                    output: output_path.display().to_string(),
                    row_index: row,
                    filled_count: outcome.filled_count,
                    writes: &outcome.writes,
                    diagnostics: &diagnostics,
                };
                std::fs::write(&report_path, report::to_json(&fill)?)?;
                println!("✔ 転記結果を保存: {}", report_path.display());
            }

            println!("\n✅ 転記完了");
        }

        Commands::Batch { template, data, output, data_sheet } => {
            println!("🚀 form-fill - 一括転記\n");
            let session = Session::new(&effective)?.with_cache(!cli.no_cache);

            println!("[1/3] テンプレートを読み込み中...");
            let loaded = session
                .open_template(&template, sheet.as_deref())
                .with_context(|| format!("テンプレート: {}", template.display()))?;
            println!("✔ {}項目を検出\n", loaded.registry.fields().count());

            println!("[2/3] データを読み込み中...");
            let table = loader::load_data_table(&data, data_sheet.as_deref())
                .with_context(|| format!("データ: {}", data.display()))?;
            println!("✔ {}列 × {}行\n", table.column_names().len(), table.row_count());

            let output_dir = output.unwrap_or_else(|| default_dir(&template));
            std::fs::create_dir_all(&output_dir)
                .with_context(|| format!("出力フォルダ: {}", output_dir.display()))?;
            let stem = export::template_stem(&template);

            println!("[3/3] 転記中...");
            let filler = session.filler();
            let mut diagnostics = loaded.diagnostics.clone();
            let mappings = filler.map(&loaded.registry, &table, &mut diagnostics);

            let pb = ProgressBar::new(table.row_count() as u64);
            pb.set_style(
                ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );

            let mut written = 0;
            for row in 0..table.row_count() {
                let outcome = filler.fill_with_mappings(
                    &loaded.spreadsheet,
                    &loaded.registry,
                    &mappings,
                    &table,
                    row,
                )?;
                let path = export::batch_output_path(&output_dir, &stem, row);
                export::save_spreadsheet(&outcome.spreadsheet, &path)?;
                pb.set_message(format!("{}", path.display()));
                diagnostics.extend(outcome.diagnostics);
                written += 1;
                pb.inc(1);
            }
            pb.finish_and_clear();

            println!("✔ {}ファイルを出力: {}", written, output_dir.display());
            report::print_diagnostics(&diagnostics);
            println!("\n✅ 一括転記完了");
        }

        Commands::Config { set_threshold, set_strategy, show } => {
            let mut config = config;

            if let Some(threshold) = set_threshold {
                config.set_threshold(threshold)?;
                println!("✔ 閾値を設定しました: {}", threshold);
            }

            if let Some(strategy) = set_strategy {
                config.set_strategy(strategy)?;
                println!("✔ 類似度戦略を設定しました: {}", strategy);
            }

            if show || (set_threshold.is_none() && set_strategy.is_none()) {
                println!("設定:");
                println!("  パス: {}", Config::config_path()?.display());
                println!("  閾値: {}", config.similarity_threshold);
                println!("  類似度戦略: {}", config.strategy);
                println!(
                    "  既定シート: {}",
                    config.default_sheet.as_deref().unwrap_or("(先頭シート)")
                );
                println!(
                    "  追加語彙: 見出し {} / 表見出し {} / 項目 {}",
                    config.vocabulary.section_phrases.len(),
                    config.vocabulary.table_terms.len(),
                    config.vocabulary.field_keywords.len()
                );
            }
        }

        Commands::Cache { clear, folder, info } => {
            let target = folder.unwrap_or_else(|| PathBuf::from("."));
            let cache_path = cache::RegistryCache::cache_path(&target);

            if info || !clear {
                if cache_path.exists() {
                    let registry_cache = cache::RegistryCache::load(&target);
                    println!("キャッシュ情報:");
                    println!("  パス: {}", cache_path.display());
                    println!("  件数: {}", registry_cache.len());
                    for entry in registry_cache.entries() {
                        println!(
                            "  - {} [{}] {}セル",
                            entry.template_name,
                            entry.sheet_name,
                            entry.registry.len()
                        );
                    }
                    if let Ok(meta) = std::fs::metadata(&cache_path) {
                        println!("  サイズ: {} bytes", meta.len());
                    }
                } else {
                    println!("キャッシュファイルが存在しません: {}", cache_path.display());
                }
            }

            if clear {
                match cache::RegistryCache::clear(&target) {
                    Ok(true) => println!("✔ キャッシュを削除しました: {}", cache_path.display()),
                    Ok(false) => println!("キャッシュファイルが存在しません"),
                    Err(e) => println!("キャッシュ削除エラー: {}", e),
                }
            }
        }
    }

    Ok(())
}

/// `RUST_LOG` を優先し、未指定なら `--verbose` で debug まで出す
fn init_tracing(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::ERROR
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// CLIの指定で設定を上書き
fn effective_config(cli: &Cli, config: &Config) -> Config {
    let mut effective = config.clone();
    if let Some(threshold) = cli.threshold {
        effective.similarity_threshold = threshold;
    }
    if let Some(strategy) = cli.strategy {
        effective.strategy = strategy;
    }
    if let Some(sheet) = &cli.sheet {
        effective.default_sheet = Some(sheet.clone());
    }
    effective
}

fn default_dir(template: &Path) -> PathBuf {
    template
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
