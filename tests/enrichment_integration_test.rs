use httpmock::prelude::*;
use std::collections::{HashMap, HashSet};
use tempfile::TempDir;
use valida_prospect::core::registry::RegistryClient;
use valida_prospect::domain::model::RegistryInfo;
use valida_prospect::domain::ports::DnsResolver;
use valida_prospect::utils::error::Result;
use valida_prospect::{CliConfig, EnrichEngine, EnrichPipeline, LocalStorage};

const INPUT_CSV: &str = "\
Empresa;CNPJ;Email
Empresa A;12.345.678/0001-95;contato@empresa-a.com.br
Empresa B;00000000000191;b@@empresa-b.com
Empresa C;11.111.111/1111-11;vendas@empresa-c.com
Empresa D;33.444.555/0001-81;financeiro@empresa-a.com.br
Empresa E;12.345.678/0001-95;sem-arroba
";

/// 離線 DNS stub：整合測試不打真實網路
struct StaticDns {
    existing: HashSet<String>,
}

impl StaticDns {
    fn new(existing: &[&str]) -> Self {
        Self {
            existing: existing.iter().map(|d| d.to_string()).collect(),
        }
    }
}

#[async_trait::async_trait]
impl DnsResolver for StaticDns {
    async fn has_mx_records(&self, domain: &str) -> Result<bool> {
        Ok(self.existing.contains(domain))
    }

    async fn has_a_records(&self, _domain: &str) -> Result<bool> {
        Ok(false)
    }
}

// 路徑一律相對於 LocalStorage 的根（測試的 temp 目錄）
fn test_config(server: &MockServer) -> CliConfig {
    CliConfig {
        input: Some("input.csv".to_string()),
        output_path: "out".to_string(),
        registry_endpoint: server.url("/cnpj"),
        email_column: "Email".to_string(),
        cnpj_column: "CNPJ".to_string(),
        cache_path: "cnpj_cache.json".to_string(),
        delimiter: ";".to_string(),
        max_calls_per_window: 3,
        cooldown_seconds: 0,
        timeout_seconds: 2,
        verbose: false,
        log_json: false,
        config: None,
    }
}

fn registry_body(status: &str, code: &str, description: &str) -> serde_json::Value {
    serde_json::json!({
        "estabelecimento": {
            "situacao_cadastral": status,
            "atividade_principal": { "id": code, "descricao": description }
        }
    })
}

fn pipeline_for(
    temp_dir: &TempDir,
    server: &MockServer,
) -> EnrichPipeline<LocalStorage, CliConfig> {
    let config = test_config(server);
    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());
    let registry = RegistryClient::new(
        &config.registry_endpoint,
        std::time::Duration::from_secs(config.timeout_seconds),
    )
    .unwrap();
    let dns = StaticDns::new(&["empresa-a.com.br", "empresa-c.com"]);
    EnrichPipeline::new(storage, config, Box::new(dns), Box::new(registry))
}

#[tokio::test]
async fn test_end_to_end_enrichment_with_real_http() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("input.csv"), INPUT_CSV).unwrap();

    let server = MockServer::start();
    let mock_a = server.mock(|when, then| {
        when.method(GET).path("/cnpj/12345678000195");
        then.status(200)
            .json_body(registry_body("Ativa", "4711-3/01", "Comércio varejista"));
    });
    let mock_b = server.mock(|when, then| {
        when.method(GET).path("/cnpj/00000000000191");
        then.status(200).json_body(registry_body(
            "Ativa",
            "6201-5/01",
            "Desenvolvimento de programas",
        ));
    });
    let mock_c = server.mock(|when, then| {
        when.method(GET).path("/cnpj/11111111111111");
        then.status(200)
            .json_body(registry_body("Baixada", "0111-3/01", "Cultivo de cereais"));
    });
    let mock_d = server.mock(|when, then| {
        when.method(GET).path("/cnpj/33444555000181");
        then.status(200)
            .json_body(registry_body("Ativa", "8599-6/04", "Treinamento"));
    });

    let engine = EnrichEngine::new(pipeline_for(&temp_dir, &server));
    let output_path = engine.run().await.unwrap();

    assert_eq!(output_path, "out/base_enriquecida.csv");

    // 重複的 CNPJ 只查一次：4 個 mock 各被打到一次，總共 4 次（不是 5）
    mock_a.assert();
    mock_b.assert();
    mock_c.assert();
    mock_d.assert();

    let output = std::fs::read_to_string(temp_dir.path().join("out/base_enriquecida.csv")).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 6);
    assert_eq!(
        lines[0],
        "Empresa;CNPJ;Email;email_valido_formato;dominio_existe;cnpj_situacao_cadastral;cnae_principal_codigo;cnae_principal_descricao;segmento_macro"
    );

    // 輸出順序與輸入一致
    for (line, company) in lines[1..].iter().zip(["Empresa A", "Empresa B", "Empresa C", "Empresa D", "Empresa E"]) {
        assert!(line.starts_with(company), "unexpected row order: {}", line);
    }

    assert!(lines[1].ends_with(";true;true;Ativa;4711-3/01;Comércio varejista;Comércio / Varejo"));
    // e-mail 格式壞掉不影響 CNPJ enrichment
    assert!(lines[2].contains(";false;false;Ativa;6201-5/01;"));
    assert!(lines[2].ends_with(";Informação e comunicação"));
    assert!(lines[3].ends_with(";Agropecuária"));
    assert!(lines[4].ends_with(";Educação"));
    // 重複的 CNPJ 拿到同一份註冊局結果
    assert!(lines[5].contains(";Ativa;4711-3/01;"));

    // 快取落盤，4 個條目
    let cache_raw = std::fs::read(temp_dir.path().join("cnpj_cache.json")).unwrap();
    let cache: HashMap<String, Option<RegistryInfo>> = serde_json::from_slice(&cache_raw).unwrap();
    assert_eq!(cache.len(), 4);
    assert!(cache.get("12345678000195").unwrap().is_some());
}

#[tokio::test]
async fn test_second_run_is_served_entirely_from_cache() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("input.csv"), INPUT_CSV).unwrap();

    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path_matches(Regex::new("^/cnpj/\\d{14}$").unwrap());
        then.status(200)
            .json_body(registry_body("Ativa", "4711-3/01", "Comércio varejista"));
    });

    let first = EnrichEngine::new(pipeline_for(&temp_dir, &server))
        .run()
        .await
        .unwrap();
    assert_eq!(mock.hits(), 4);

    // 第二次執行：全部命中磁碟快取，零外部呼叫，輸出相同
    let second = EnrichEngine::new(pipeline_for(&temp_dir, &server))
        .run()
        .await
        .unwrap();
    assert_eq!(mock.hits(), 4);

    let first_output = std::fs::read_to_string(temp_dir.path().join(&first)).unwrap();
    let second_output = std::fs::read_to_string(temp_dir.path().join(&second)).unwrap();
    assert_eq!(first_output, second_output);
}

#[tokio::test]
async fn test_registry_failures_do_not_abort_the_batch() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("input.csv"),
        "Empresa;CNPJ;Email\n\
         Boa;12.345.678/0001-95;a@empresa-a.com.br\n\
         Sem dados;00000000000191;b@empresa-a.com.br\n\
         Limitada;11.111.111/1111-11;c@empresa-a.com.br\n",
    )
    .unwrap();

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/cnpj/12345678000195");
        then.status(200)
            .json_body(registry_body("Ativa", "4711-3/01", "Comércio varejista"));
    });
    server.mock(|when, then| {
        when.method(GET).path("/cnpj/00000000000191");
        then.status(404);
    });
    let quota_mock = server.mock(|when, then| {
        when.method(GET).path("/cnpj/11111111111111");
        then.status(429);
    });

    let engine = EnrichEngine::new(pipeline_for(&temp_dir, &server));
    let output_path = engine.run().await.unwrap();

    let output = std::fs::read_to_string(temp_dir.path().join(&output_path)).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 4);

    assert!(lines[1].contains(";Ativa;4711-3/01;"));
    // 失敗的列仍然存在，enrichment 欄位空白
    assert!(lines[2].ends_with(";true;true;;;;"));
    assert!(lines[3].ends_with(";true;true;;;;"));
    quota_mock.assert();

    // 404 與 429 都記成負向快取條目：下次不再為已知失敗的 CNPJ 花配額
    let cache_raw = std::fs::read(temp_dir.path().join("cnpj_cache.json")).unwrap();
    let cache: HashMap<String, Option<RegistryInfo>> = serde_json::from_slice(&cache_raw).unwrap();
    assert_eq!(cache.len(), 3);
    assert!(cache.get("00000000000191").unwrap().is_none());
    assert!(cache.get("11111111111111").unwrap().is_none());
}
