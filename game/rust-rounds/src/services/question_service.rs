use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    GameMode, GuessRequest, GuessResult, Question, QuestionOption, QuestionType, RoundConfig,
    Subject, Token,
};

type HmacSha256 = Hmac<Sha256>;

const SAMPLE_CATALOG: &str = include_str!("../../data/sample_catalog.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog has {available} usable entries, {needed} needed")]
    NotEnoughSubjects { needed: usize, available: usize },

    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to sign question token")]
    Signing,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Invalid token.")]
    Invalid,

    #[error("Token already used.")]
    AlreadyUsed,
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenPayload {
    answer_id: String,
    nonce: String,
}

/// Signs answer ids into tokens so the server keeps no per-question state.
pub struct TokenSigner {
    secret: Vec<u8>,
}

impl TokenSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
        }
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(&self.secret).map_err(|_| TokenError::Invalid)
    }

    fn sign(&self, payload: &TokenPayload) -> Result<Token, TokenError> {
        let body = serde_json::to_vec(payload).map_err(|_| TokenError::Invalid)?;
        let encoded = URL_SAFE_NO_PAD.encode(&body);

        let mut mac = self.mac()?;
        mac.update(encoded.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(Token::new(format!("{}.{}", encoded, signature)))
    }

    fn verify(&self, token: &Token) -> Result<TokenPayload, TokenError> {
        let (encoded, signature) = token
            .as_str()
            .split_once('.')
            .ok_or(TokenError::Invalid)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Invalid)?;

        let mut mac = self.mac()?;
        mac.update(encoded.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::Invalid)?;

        let body = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| TokenError::Invalid)?;
        serde_json::from_slice(&body).map_err(|_| TokenError::Invalid)
    }
}

/// Builds questions from the subject catalog and checks guesses against signed tokens.
pub struct QuestionService {
    subjects: Vec<Subject>,
    signer: TokenSigner,
    used_nonces: Mutex<HashSet<String>>,
}

impl QuestionService {
    pub fn new(subjects: Vec<Subject>, secret: &str) -> Self {
        Self {
            subjects,
            signer: TokenSigner::new(secret),
            used_nonces: Mutex::new(HashSet::new()),
        }
    }

    pub fn load_catalog(path: Option<&Path>) -> Result<Vec<Subject>, CatalogError> {
        let subjects: Vec<Subject> = match path {
            Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
            None => serde_json::from_str(SAMPLE_CATALOG)?,
        };
        Ok(subjects)
    }

    pub fn catalog_size(&self) -> usize {
        self.subjects.len()
    }

    pub fn issue(&self, config: RoundConfig) -> Result<Question, CatalogError> {
        let mut rng = rand::rng();
        let preferred = match config.game_mode {
            GameMode::IdentifySubject => QuestionType::IdentifySubject,
            GameMode::IdentifyCategory => QuestionType::IdentifyCategory,
            GameMode::Mixed if rng.random_bool(0.5) => QuestionType::IdentifyCategory,
            GameMode::Mixed => QuestionType::IdentifySubject,
        };

        match self.build(preferred, config, &mut rng) {
            Err(CatalogError::NotEnoughSubjects { .. }) if config.game_mode == GameMode::Mixed => {
                let fallback = match preferred {
                    QuestionType::IdentifySubject => QuestionType::IdentifyCategory,
                    QuestionType::IdentifyCategory => QuestionType::IdentifySubject,
                };
                self.build(fallback, config, &mut rng)
            }
            other => other,
        }
    }

    fn build(
        &self,
        question_type: QuestionType,
        config: RoundConfig,
        rng: &mut impl Rng,
    ) -> Result<Question, CatalogError> {
        let needed = config.difficulty.option_count();
        let pool: Vec<&Subject> = self
            .subjects
            .iter()
            .filter(|subject| subject.image_url.is_some())
            .collect();
        let subject = *pool.choose(rng).ok_or(CatalogError::NotEnoughSubjects {
            needed,
            available: 0,
        })?;

        let (prompt, answer_id, mut options) = match question_type {
            QuestionType::IdentifySubject => {
                let mut options = vec![subject_option(subject)];
                options.extend(pick_distractors(&pool, subject, needed - 1, rng)?.into_iter().map(subject_option));
                ("Who is this?".to_string(), subject.id.clone(), options)
            }
            QuestionType::IdentifyCategory => {
                let mut categories: Vec<&str> = self
                    .subjects
                    .iter()
                    .map(|other| other.category.as_str())
                    .filter(|category| *category != subject.category)
                    .collect();
                categories.sort_unstable();
                categories.dedup();
                if categories.len() < needed - 1 {
                    return Err(CatalogError::NotEnoughSubjects {
                        needed,
                        available: categories.len() + 1,
                    });
                }

                let mut options = vec![category_option(&subject.category)];
                options.extend(
                    categories
                        .choose_multiple(rng, needed - 1)
                        .map(|category| category_option(category)),
                );
                (
                    format!("Which category does {} belong to?", subject.name),
                    subject.category.clone(),
                    options,
                )
            }
        };
        options.shuffle(rng);

        let token = self
            .signer
            .sign(&TokenPayload {
                answer_id,
                nonce: Uuid::new_v4().to_string(),
            })
            .map_err(|_| CatalogError::Signing)?;

        Ok(Question {
            token,
            question_type,
            prompt,
            image_url: subject.image_url.clone(),
            options,
        })
    }

    /// Checks a guess. Each token is accepted once.
    pub fn check_guess(&self, request: &GuessRequest) -> Result<GuessResult, TokenError> {
        let payload = self.signer.verify(&request.token)?;

        {
            let mut used = self
                .used_nonces
                .lock()
                .map_err(|_| TokenError::Invalid)?;
            if !used.insert(payload.nonce.clone()) {
                return Err(TokenError::AlreadyUsed);
            }
        }

        Ok(GuessResult {
            correct: request.answer.trim() == payload.answer_id,
            answer_id: payload.answer_id,
        })
    }
}

fn subject_option(subject: &Subject) -> QuestionOption {
    QuestionOption {
        id: subject.id.clone(),
        label: subject.name.clone(),
    }
}

fn category_option(category: &str) -> QuestionOption {
    QuestionOption {
        id: category.to_string(),
        label: category.to_string(),
    }
}

/// Distractors from the same cohort when there are enough of them, otherwise from anyone.
fn pick_distractors<'a>(
    pool: &[&'a Subject],
    subject: &Subject,
    count: usize,
    rng: &mut impl Rng,
) -> Result<Vec<&'a Subject>, CatalogError> {
    let others: Vec<&'a Subject> = pool
        .iter()
        .copied()
        .filter(|other| other.id != subject.id)
        .collect();

    let same_cohort: Vec<&'a Subject> = match &subject.cohort {
        Some(cohort) => others
            .iter()
            .copied()
            .filter(|other| other.cohort.as_ref() == Some(cohort))
            .collect(),
        None => Vec::new(),
    };

    let candidates = if same_cohort.len() >= count {
        same_cohort
    } else {
        others
    };
    if candidates.len() < count {
        return Err(CatalogError::NotEnoughSubjects {
            needed: count + 1,
            available: candidates.len() + 1,
        });
    }

    Ok(candidates.choose_multiple(rng, count).copied().collect())
}
