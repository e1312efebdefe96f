use defi_lens::adapters::SourceSettings;
use defi_lens::config::TomlConfig;
use defi_lens::core::export::{BUNDLE_FILE, RANKED_FILE, TABLE_FILE, VIEW_FILE};
use defi_lens::domain::ports::RecordSource;
use defi_lens::{
    build_source, CachedSource, CliConfig, DashboardEngine, DashboardPipeline, LensError,
    LlamaSource, LocalStorage,
};
use clap::Parser;
use httpmock::prelude::*;
use std::io::Read;
use std::time::Duration;
use tempfile::TempDir;

fn llama_payload() -> serde_json::Value {
    serde_json::json!([
        {"name": "Lido", "slug": "lido", "tvl": 3.1e10, "mcap": 1.9e9, "chain": "Ethereum", "category": "Liquid Staking", "symbol": "LDO"},
        {"name": "AAVE V3", "slug": "aave-v3", "tvl": 1.2e10, "mcap": 2.4e9, "chain": "Multi-Chain", "category": "Lending"},
        {"name": "Uniswap V3", "slug": "uniswap-v3", "tvl": 4.5e9, "mcap": 5.8e9, "chain": "Multi-Chain", "category": "Dexes"},
        {"name": "Raydium", "slug": "raydium", "tvl": 1.5e9, "mcap": 9.0e8, "chain": "Solana", "category": "Dexes"},
        {"name": "Orca", "slug": "orca", "tvl": 3.0e8, "mcap": 1.8e8, "chain": "Solana", "category": "Dexes"},
        {"name": "Osmosis DEX", "slug": "osmosis-dex", "tvl": 1.0e8, "mcap": 4.0e8, "chain": "Osmosis", "category": "Dexes"},
        {"name": "Unlisted", "slug": "unlisted", "tvl": 2.0e7, "mcap": 0, "chain": "Ethereum", "category": "Yield"},
        {"name": "Garbled", "slug": "garbled", "tvl": "N/A", "mcap": 1.0e9, "chain": "Ethereum", "category": "Dexes"}
    ])
}

fn read_entry(archive: &mut zip::ZipArchive<std::io::Cursor<Vec<u8>>>, name: &str) -> String {
    let mut content = String::new();
    archive
        .by_name(name)
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    content
}

#[tokio::test]
async fn test_llama_source_reads_protocols() {
    let server = MockServer::start_async().await;
    let api_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/protocols");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(llama_payload());
        })
        .await;

    let source = LlamaSource::new(server.url("/protocols")).with_timeout(Duration::from_secs(5));
    let records = source.fetch_all().await.unwrap();

    api_mock.assert_async().await;
    assert_eq!(records.len(), 8);
    assert_eq!(
        records[0].get("slug").and_then(|v| v.as_str()),
        Some("lido")
    );
}

#[tokio::test]
async fn test_llama_source_reports_status() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/protocols");
            then.status(503);
        })
        .await;

    let result = LlamaSource::new(server.url("/protocols")).fetch_all().await;

    assert!(matches!(
        result,
        Err(LensError::ApiStatusError { status: 503, .. })
    ));
}

#[tokio::test]
async fn test_cached_source_fetches_once() {
    let server = MockServer::start_async().await;
    let api_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/protocols");
            then.status(200).json_body(llama_payload());
        })
        .await;

    let source = CachedSource::new(
        LlamaSource::new(server.url("/protocols")),
        Duration::from_secs(60),
    );
    source.fetch_all().await.unwrap();
    source.fetch_all().await.unwrap();

    api_mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_end_to_end_cli_run() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start_async().await;
    let api_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/protocols");
            then.status(200).json_body(llama_payload());
        })
        .await;

    let endpoint = server.url("/protocols");
    let config = CliConfig::parse_from([
        "defi-lens",
        "--endpoint",
        endpoint.as_str(),
        "--output-path",
        output_path.as_str(),
        "--group-by",
        "category-chain",
        "--top-n",
        "2",
    ]);

    let source = build_source(&config.source_settings());
    let storage = LocalStorage::new(output_path.clone());
    let engine = DashboardEngine::new(DashboardPipeline::new(source, storage, config));

    let result = engine.run().await.unwrap();

    api_mock.assert_async().await;
    assert!(result.ends_with(BUNDLE_FILE));

    let bytes = std::fs::read(temp_dir.path().join(BUNDLE_FILE)).unwrap();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
    assert_eq!(archive.len(), 3);

    let table = read_entry(&mut archive, TABLE_FILE);
    let rows: Vec<&str> = table.lines().collect();
    // the table keeps every chain; only the ranked view is chain-filtered
    assert_eq!(rows.len(), 7);
    assert!(rows[1].starts_with("Uniswap V3,"));
    assert!(!table.contains("Garbled"));
    assert!(!table.contains("Unlisted"));

    let ranked = read_entry(&mut archive, RANKED_FILE);
    assert_eq!(
        ranked.lines().next(),
        Some("group_category,group_chain,rank,name,slug,tvl,mcap,chain,category")
    );
    assert!(ranked.contains("Dexes,Multi-Chain,0,Uniswap V3"));
    assert!(ranked.contains("Dexes,Solana,0,Raydium"));
    assert!(ranked.contains("Dexes,Solana,1,Orca"));
    assert!(!ranked.contains("Osmosis"));

    let view: serde_json::Value = serde_json::from_str(&read_entry(&mut archive, VIEW_FILE)).unwrap();
    assert_eq!(view["diagnostics"]["malformed"], 1);
    assert_eq!(view["group_by"], "category-chain");
    assert_eq!(
        view["chain_options"],
        serde_json::json!(["Multi-Chain", "Ethereum", "Solana", "Osmosis"])
    );
}

#[tokio::test]
async fn test_toml_views_from_file_source() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("protocols.json");
    std::fs::write(&input, llama_payload().to_string()).unwrap();
    let output = temp_dir.path().join("out");

    let content = format!(
        r#"
[dashboard]
name = "offline"
output_path = "{}"

[source]
input_file = "{}"

[filter]
all_chains = true

[[views]]
name = "by-chain"
group_by = ["chain"]
top_n = 1

[[views]]
name = "by-category"
group_by = ["category"]
ranks = [1]
"#,
        output.to_string_lossy().replace('\\', "/"),
        input.to_string_lossy().replace('\\', "/")
    );
    let config = TomlConfig::from_toml_str(&content).unwrap();
    let settings: SourceSettings = config.source_settings();
    let source = build_source(&settings);

    for view in config.view_settings().unwrap() {
        let storage = LocalStorage::new(view.output_path.clone());
        let engine = DashboardEngine::new(DashboardPipeline::new(source.clone(), storage, view));
        let preview = engine.preview().await.unwrap();
        assert!(!preview.ranked.is_empty());
        engine.run().await.unwrap();
    }

    assert!(output.join("by-chain").join(BUNDLE_FILE).exists());
    assert!(output.join("by-category").join(BUNDLE_FILE).exists());
}
