//! Tipos de dados para a API de valores da planilha.
//!
//! Structs serde no formato dos endpoints `values.get`, `values.update`
//! e `values.batchUpdate` do backend de planilha.

use serde::{Deserialize, Serialize};

/// Um retângulo de células com seu intervalo A1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueRange {
    /// Intervalo A1, incluindo o nome da aba (ex.: `Daily_Runs!C2`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    /// Linhas de células. Ausente na resposta quando o intervalo está vazio.
    #[serde(default)]
    pub values: Vec<Vec<String>>,
}

/// Corpo da requisição para `values.batchUpdate`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateValuesRequest {
    /// Sempre "RAW": os valores são gravados sem interpretação.
    pub value_input_option: String,
    pub data: Vec<ValueRange>,
}

/// Uma única escrita de célula pendente, produzida por um worker e
/// de posse do write buffer até o flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingWrite {
    /// Endereço A1 completo do destino, incluindo a aba.
    pub range: String,
    pub value: String,
}

impl PendingWrite {
    pub fn new(range: String, value: String) -> Self {
        Self { range, value }
    }
}

impl From<&PendingWrite> for ValueRange {
    fn from(w: &PendingWrite) -> Self {
        ValueRange {
            range: Some(w.range.clone()),
            values: vec![vec![w.value.clone()]],
        }
    }
}
