//! Logical resources and typed views of remote records
//!
//! The hosted backend exposes named tables; this module fixes the closed set
//! of logical resource names and the typed shapes the client decodes remote
//! rows into. Field names mirror the hosted schema.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A named logical table on the hosted backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    /// Client records
    Clientes,
    /// Product catalog
    Produtos,
    /// Completed and pending sales
    Vendas,
    /// Sales funnel opportunities
    Oportunidades,
}

impl Resource {
    /// All resources
    pub const ALL: [Resource; 4] = [
        Resource::Clientes,
        Resource::Produtos,
        Resource::Vendas,
        Resource::Oportunidades,
    ];

    /// The logical table name sent to the backend
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Clientes => "clientes",
            Resource::Produtos => "produtos",
            Resource::Vendas => "vendas",
            Resource::Oportunidades => "oportunidades",
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clientes" => Ok(Resource::Clientes),
            "produtos" => Ok(Resource::Produtos),
            "vendas" => Ok(Resource::Vendas),
            "oportunidades" => Ok(Resource::Oportunidades),
            _ => Err(format!("Unknown resource: {}", s)),
        }
    }
}

/// A client record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cliente {
    /// Backend-assigned id
    pub id: String,

    /// Display name
    pub nome: String,

    /// Contact email
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Contact phone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefone: Option<String>,

    /// Company, when the client is a business
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empresa: Option<String>,
}

/// A product record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Produto {
    /// Backend-assigned id
    pub id: String,

    /// Display name
    pub nome: String,

    /// Unit price in BRL
    pub preco: f64,

    /// Units in stock
    pub estoque: i64,

    /// Catalog category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categoria: Option<String>,
}

/// Sale settlement status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VendaStatus {
    /// Awaiting payment
    #[default]
    Pendente,
    /// Paid and settled
    Concluida,
    /// Cancelled before settlement
    Cancelada,
}

/// A sale record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Venda {
    /// Backend-assigned id
    pub id: String,

    /// Buying client
    pub cliente_id: String,

    /// Total value in BRL
    pub valor: f64,

    /// Settlement status
    #[serde(default)]
    pub status: VendaStatus,
}

/// Sales funnel stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FunnelStage {
    /// Initial contact
    #[default]
    Prospeccao,
    /// Qualified lead
    Qualificacao,
    /// Proposal sent
    Proposta,
    /// Terms under negotiation
    Negociacao,
    /// Deal closed
    Fechamento,
}

impl FunnelStage {
    /// Funnel stages in pipeline order
    pub const ALL: [FunnelStage; 5] = [
        FunnelStage::Prospeccao,
        FunnelStage::Qualificacao,
        FunnelStage::Proposta,
        FunnelStage::Negociacao,
        FunnelStage::Fechamento,
    ];

    /// Display label (pt-BR)
    pub fn label(&self) -> &'static str {
        match self {
            FunnelStage::Prospeccao => "Prospecção",
            FunnelStage::Qualificacao => "Qualificação",
            FunnelStage::Proposta => "Proposta",
            FunnelStage::Negociacao => "Negociação",
            FunnelStage::Fechamento => "Fechamento",
        }
    }
}

/// A sales-funnel opportunity record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Oportunidade {
    /// Backend-assigned id
    pub id: String,

    /// Short description of the deal
    pub titulo: String,

    /// Expected value in BRL
    pub valor: f64,

    /// Current funnel stage
    #[serde(default)]
    pub etapa: FunnelStage,

    /// Related client, when already registered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cliente_id: Option<String>,
}

/// Aggregate totals from the sales-summary endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryTotals {
    /// Summed sale value in BRL
    pub total_vendas: f64,

    /// Number of sales in the period
    pub quantidade: u32,

    /// Average ticket in BRL
    pub ticket_medio: f64,
}

/// One point of the sales time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    /// Bucket label (day or month, backend-chosen)
    pub data: String,

    /// Summed value for the bucket in BRL
    pub valor: f64,
}

/// The period a summary covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryPeriod {
    /// First day included
    pub inicio: NaiveDate,

    /// Last day included
    pub fim: NaiveDate,
}

/// Response of the `sales-summary` callable endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    /// Aggregate totals
    pub totals: SummaryTotals,

    /// Per-bucket time series
    pub series: Vec<SeriesPoint>,

    /// Covered period
    pub period: SummaryPeriod,
}
