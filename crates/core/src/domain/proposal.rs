use crate::domain::parse::{parse_date, parse_money};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One proposal exactly as the upstream API returns it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawProposal {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub plano_codigo: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub plano_nome: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub proposta: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub digito: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub grupo: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub cota: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub vendedor_cpf: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub vendedor_nome: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub cliente_cpf: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub cliente_nome: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub nova_reposicao: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub valor_bem: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub data_venda: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub data_bordero: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub cidade: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub modelo: Option<String>,
}

/// New sale vs. replacement of a previous quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SaleKind {
    #[serde(rename = "NOVA")]
    New,
    #[serde(rename = "REPOSICAO")]
    Replacement,
}

impl SaleKind {
    pub const ALL: [SaleKind; 2] = [SaleKind::New, SaleKind::Replacement];

    /// Maps the upstream indicator. Only an exact `N` is a new sale; anything else,
    /// missing included, counts as a replacement.
    pub fn from_indicator(indicator: Option<&str>) -> Self {
        match indicator {
            Some("N") => SaleKind::New,
            _ => SaleKind::Replacement,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SaleKind::New => "NOVA",
            SaleKind::Replacement => "REPOSICAO",
        }
    }
}

/// Which of the two proposal dates places a record in a time bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateBasis {
    #[default]
    Sale,
    Bordero,
}

impl std::str::FromStr for DateBasis {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sale" | "venda" => Ok(DateBasis::Sale),
            "bordero" => Ok(DateBasis::Bordero),
            other => anyhow::bail!("unknown date basis: {other}"),
        }
    }
}

/// A normalized proposal. Built once at ingest, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalRecord {
    pub id: Option<i64>,
    pub plan_code: Option<String>,
    pub plan_name: Option<String>,
    pub proposal_number: Option<String>,
    pub check_digit: Option<String>,
    pub group: Option<String>,
    pub quota: Option<String>,
    pub vendor_tax_id: Option<String>,
    pub vendor_name: Option<String>,
    pub client_tax_id: Option<String>,
    pub client_name: Option<String>,
    pub kind: SaleKind,
    pub credit_value: f64,
    pub sale_date: Option<NaiveDate>,
    pub bordero_date: Option<NaiveDate>,
    pub city: Option<String>,
    pub model: Option<String>,
}

/// Counts of fields that were present upstream but could not be parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    pub records: usize,
    pub bad_values: usize,
    pub bad_sale_dates: usize,
    pub bad_bordero_dates: usize,
}

impl ProposalRecord {
    pub fn from_raw(raw: RawProposal) -> Self {
        Self::from_raw_tracked(raw, &mut NormalizeStats::default())
    }

    fn from_raw_tracked(raw: RawProposal, stats: &mut NormalizeStats) -> Self {
        stats.records += 1;

        let value = clean(raw.valor_bem);
        let credit_value = match value.as_deref().map(parse_money) {
            Some(Some(v)) => v,
            Some(None) => {
                stats.bad_values += 1;
                0.0
            }
            None => 0.0,
        };

        let sale_date = parse_tracked(clean(raw.data_venda), &mut stats.bad_sale_dates);
        let bordero_date = parse_tracked(clean(raw.data_bordero), &mut stats.bad_bordero_dates);

        Self {
            id: raw.id,
            plan_code: clean(raw.plano_codigo),
            plan_name: clean(raw.plano_nome),
            proposal_number: clean(raw.proposta),
            check_digit: clean(raw.digito),
            group: clean(raw.grupo),
            quota: clean(raw.cota),
            vendor_tax_id: clean(raw.vendedor_cpf),
            vendor_name: clean(raw.vendedor_nome),
            client_tax_id: clean(raw.cliente_cpf),
            client_name: clean(raw.cliente_nome),
            kind: SaleKind::from_indicator(raw.nova_reposicao.as_deref()),
            credit_value,
            sale_date,
            bordero_date,
            city: clean(raw.cidade),
            model: clean(raw.modelo),
        }
    }

    pub fn date(&self, basis: DateBasis) -> Option<NaiveDate> {
        match basis {
            DateBasis::Sale => self.sale_date,
            DateBasis::Bordero => self.bordero_date,
        }
    }
}

/// Converts a fetched batch into typed records, logging what could not be parsed.
pub fn normalize(raws: Vec<RawProposal>) -> Vec<ProposalRecord> {
    let mut stats = NormalizeStats::default();
    let records: Vec<ProposalRecord> = raws
        .into_iter()
        .map(|raw| ProposalRecord::from_raw_tracked(raw, &mut stats))
        .collect();

    if stats.bad_values + stats.bad_sale_dates + stats.bad_bordero_dates > 0 {
        tracing::debug!(
            records = stats.records,
            bad_values = stats.bad_values,
            bad_sale_dates = stats.bad_sale_dates,
            bad_bordero_dates = stats.bad_bordero_dates,
            "normalized proposals with unparseable fields"
        );
    }

    records
}

fn clean(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn parse_tracked(v: Option<String>, bad: &mut usize) -> Option<NaiveDate> {
    let s = v?;
    let parsed = parse_date(&s);
    if parsed.is_none() {
        *bad += 1;
    }
    parsed
}

fn de_opt_text<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

fn de_opt_id<'de, D>(d: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
