
use std::sync::Arc;
use tracing::debug;

use crate::Result;
use crate::assistant::models::ResolvedProduct;
use crate::config::GenerationConfig;
use crate::providers::{CompletionProvider, CompletionRequest};

/// Answer meaning the user moved on to a different product
pub const NEW_PRODUCT_SENTINEL: &str = "novo";
/// Answer meaning the message needs a catalog search
pub const LOOKUP_SENTINEL: &str = "sim";

/// Two single-shot yes/no classifiers backed by the generation provider.
///
/// Anything other than the exact sentinel counts as `false`, so an unclear
/// answer keeps the conversation on its current footing.
#[derive(Clone)]
pub struct IntentClassifier {
    completions: Arc<dyn CompletionProvider>,
    temperature: f32,
    max_tokens: u32,
}

impl IntentClassifier {
    #[inline]
    pub fn new(completions: Arc<dyn CompletionProvider>, generation: &GenerationConfig) -> Self {
        Self {
            completions,
            temperature: generation.classifier_temperature,
            max_tokens: generation.classifier_max_tokens,
        }
    }

    /// Does `message` ask about something other than `current`?
    #[inline]
    pub async fn wants_different_product(
        &self,
        message: &str,
        current: &ResolvedProduct,
    ) -> Result<bool> {
        let answer = self.ask(different_product_prompt(message, current)).await?;
        let different = matches_sentinel(&answer, NEW_PRODUCT_SENTINEL);
        debug!(
            "Different-product classifier answered {:?} -> {}",
            answer, different
        );
        Ok(different)
    }

    /// Does `message` need a catalog search at all?
    #[inline]
    pub async fn needs_product_lookup(&self, message: &str) -> Result<bool> {
        let answer = self.ask(lookup_prompt(message)).await?;
        let lookup = matches_sentinel(&answer, LOOKUP_SENTINEL);
        debug!("Lookup classifier answered {:?} -> {}", answer, lookup);
        Ok(lookup)
    }

    async fn ask(&self, prompt: String) -> Result<String> {
        self.completions
            .complete(CompletionRequest::prompt(
                prompt,
                self.temperature,
                self.max_tokens,
            ))
            .await
    }
}

/// Exact comparison ignoring only surrounding whitespace and case
#[inline]
pub fn matches_sentinel(answer: &str, sentinel: &str) -> bool {
    answer.trim().to_lowercase() == sentinel.to_lowercase()
}

fn different_product_prompt(message: &str, current: &ResolvedProduct) -> String {
    format!(
        r#"Analise a seguinte mensagem do usuário e determine se ela está perguntando sobre um produto DIFERENTE do produto atual.

PRODUTO ATUAL:
Nome: {name}
Descrição: {description}

MENSAGEM DO USUÁRIO:
"{message}"

Considere que o usuário está interessado em um NOVO produto quando:
1. Pergunta sobre um produto diferente do atual
2. Usa frases como "tem algum", "você vende", "quero comprar", "preciso de"
3. Menciona características ou tipos de produtos diferentes do atual
4. Faz perguntas sobre outros produtos ou categorias
5. Usa palavras como "outro", "diferente", "além", "também"

Considere que o usuário ainda está interessado no produto ATUAL quando:
1. Faz perguntas sobre como usar o produto atual
2. Pergunta sobre características específicas do produto atual
3. Quer mais detalhes sobre o produto atual
4. Pergunta sobre preço, disponibilidade ou onde encontrar o produto atual
5. Usa palavras como "este", "esse", "ele", "o mesmo"

Responda apenas com "NOVO" se o usuário estiver interessado em um produto diferente, ou "ATUAL" se ainda estiver falando sobre o produto atual."#,
        name = current.name,
        description = current.description,
    )
}

fn lookup_prompt(message: &str) -> String {
    format!(
        r#"Analise a seguinte mensagem do usuário e determine se ela está perguntando sobre produtos específicos de limpeza que precisam ser buscados no catálogo.
Considere que devemos buscar produtos quando o usuário:
- Pergunta sobre um produto específico
- Quer saber preços
- Quer saber onde encontrar um produto
- Quer saber como usar um produto específico
- Pergunta sobre características específicas de um produto
- Usa frases como "tem algum", "você vende", "quero comprar", "preciso de"
- Usa palavras como "outro", "diferente", "além", "também"

Mensagem do usuário: "{message}"

Responda apenas com "SIM" se precisar buscar produtos, ou "NAO" se for uma pergunta geral sobre limpeza."#
    )
}
