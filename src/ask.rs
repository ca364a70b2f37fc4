//! The question-answering pipeline.
//!
//! Validates the question, loads the document scope, runs retrieval, blends
//! optional web context, composes the prompt, and calls the completion
//! service through the fallback policy. Shared by the `dqa ask` / `dqa
//! retrieve` commands and the HTTP API.

use anyhow::{bail, Result};

use crate::completion::{self, CompletionProvider, FallbackPolicy, OpenAiCompatProvider};
use crate::config::Config;
use crate::db;
use crate::docs::{self, QueryScope};
use crate::models::WebResult;
use crate::retrieve::{self, Citation, Retrieval};
use crate::users;
use crate::websearch;

/// A validated ask request.
#[derive(Debug, Clone)]
pub struct AskRequest {
    pub user: String,
    pub question: String,
    pub scope: QueryScope,
    pub top_k: Option<usize>,
    pub web: bool,
}

/// Answer plus provenance.
#[derive(Debug)]
pub struct AskOutcome {
    pub answer: String,
    pub model: String,
    pub citations: Vec<Citation>,
    pub web_sources: Vec<WebResult>,
}

/// Run retrieval only: validate, load scope, select top-K.
///
/// The completion service is never touched; this is both the `dqa retrieve`
/// command and the `/retrieve` endpoint.
pub async fn retrieve_context(
    config: &Config,
    user_email: &str,
    question: &str,
    scope: &QueryScope,
    top_k: Option<usize>,
) -> Result<Retrieval> {
    let question = retrieve::validate_question(question)?;

    let pool = db::connect(config).await?;
    let user = users::require_approved(&pool, user_email).await?;
    let documents = docs::load_scope(&pool, &user.id, scope).await?;
    pool.close().await;

    if documents.is_empty() {
        bail!("no documents found in scope");
    }

    let top_k = top_k.unwrap_or(if scope.is_single_document() {
        config.retrieval.top_k_single
    } else {
        config.retrieval.top_k_multi
    });

    let params = config.chunking.params()?;
    Ok(retrieve::retrieve(&documents, question, &params, top_k))
}

/// Full ask flow against the configured completion provider.
///
/// Retrieval runs first: an invalid question or an empty scope rejects the
/// request before the provider (and its API key) is even constructed.
pub async fn answer_question(config: &Config, request: &AskRequest) -> Result<AskOutcome> {
    let retrieval =
        retrieve_context(config, &request.user, &request.question, &request.scope, request.top_k)
            .await?;

    let provider = OpenAiCompatProvider::new(&config.completion)?;
    let policy = FallbackPolicy::from_config(&config.completion);
    complete_retrieval(config, request, retrieval, &provider, &policy).await
}

async fn complete_retrieval(
    config: &Config,
    request: &AskRequest,
    retrieval: Retrieval,
    provider: &dyn CompletionProvider,
    policy: &FallbackPolicy,
) -> Result<AskOutcome> {
    let web_sources = if request.web {
        websearch::search_web(&config.websearch, request.question.trim()).await?
    } else {
        Vec::new()
    };

    let prompt = build_prompt(request.question.trim(), &retrieval.context, &web_sources);
    let (answer, model) = completion::complete_with_fallback(provider, policy, &prompt).await?;

    Ok(AskOutcome {
        answer,
        model,
        citations: retrieval.citations,
        web_sources,
    })
}

/// Compose the completion prompt: document sections, optional web results,
/// then the question.
fn build_prompt(question: &str, context: &str, web: &[WebResult]) -> String {
    let mut prompt = String::from(
        "Answer the question using the document excerpts below. \
         If the excerpts do not contain the answer, say so.\n\n",
    );
    prompt.push_str("Document excerpts:\n");
    prompt.push_str(context);

    if !web.is_empty() {
        prompt.push_str("\n\nWeb search results:\n");
        for result in web {
            prompt.push_str(&format!("- {} ({})\n  {}\n", result.title, result.url, result.snippet));
        }
    }

    prompt.push_str("\n\nQuestion: ");
    prompt.push_str(question);
    prompt
}

// ============ CLI entry points ============

pub async fn run_ask(config: &Config, request: &AskRequest) -> Result<()> {
    let outcome = answer_question(config, request).await?;

    println!("{}", outcome.answer);
    println!();
    print_citations(&outcome.citations);
    if !outcome.web_sources.is_empty() {
        println!();
        println!("Web sources:");
        for source in &outcome.web_sources {
            println!("  {} ({})", source.title, source.url);
        }
    }
    println!();
    println!("model: {}", outcome.model);
    Ok(())
}

pub async fn run_retrieve(
    config: &Config,
    user_email: &str,
    question: &str,
    scope: &QueryScope,
    top_k: Option<usize>,
) -> Result<()> {
    let retrieval = retrieve_context(config, user_email, question, scope, top_k).await?;

    println!("{}", retrieval.context);
    println!();
    print_citations(&retrieval.citations);
    Ok(())
}

fn print_citations(citations: &[Citation]) {
    println!("Sources:");
    for citation in citations {
        println!("  {}", citation.filename);
        for chunk in &citation.chunks {
            println!("    [{}] {}", chunk.index, chunk.preview.replace('\n', " "));
        }
    }
}
