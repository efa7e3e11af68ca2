use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::{debug, info, warn};
use rand::Rng;
use reqwest::{header::CONTENT_TYPE, Client};
use serde::{Deserialize, Serialize};

use crate::category::{BristolType, Category, StoolColor, Volume};
use crate::error::AnalysisError;

/// 画像解析に利用する補完APIの既定のURL。
pub const DEFAULT_ANALYSIS_URL: &str = "https://toolkit.rork.com/text/llm/";

const SYSTEM_PROMPT: &str = "You are an expert medical AI specialized in analyzing stool samples based on the Bristol Stool Scale. Analyze the provided image and determine: 1) Stool type (1-7 on Bristol Scale), 2) Volume (small/medium/large), and 3) Color (brown, dark brown, light brown, yellow, green, red, or black). Provide a brief explanation for your assessment. Format your response as JSON: {\"type\": number, \"volume\": number, \"color\": number, \"explanation\": \"text\"}. For volume, use 1 for small, 2 for medium, 3 for large. For color, use 1 for brown, 2 for dark brown, 3 for light brown, 4 for yellow, 5 for green, 6 for red, 7 for black.";

const USER_PROMPT: &str = "Analyze this stool sample image:";

const FALLBACK_EXPLANATION: &str = "This is a simulated analysis. The image could not be analyzed, so these values are placeholders for you to review.";

const STUB_EXPLANATION: &str = "This is a mock analysis from the backend. In a real implementation, we would analyze the image and provide detailed insights.";

/// 補完APIへのリクエスト。
#[derive(Debug, Serialize)]
struct CompletionRequest {
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ContentPart {
    Text { text: String },
    Image { image: String },
}

/// 補完APIのレスポンスをデシリアライズするための構造体。
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    completion: String,
}

/// 補完結果に含まれる解析結果。値の範囲は変換時に検証する。
#[derive(Debug, Deserialize)]
struct RawAnalysis {
    #[serde(rename = "type")]
    kind: u8,
    volume: u8,
    color: u8,
    #[serde(default)]
    explanation: String,
}

/// 画像から推定したカテゴリ。全ての値は範囲内であることが保証される。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalysisOutcome {
    pub kind: BristolType,
    pub volume: Volume,
    pub color: StoolColor,
    pub explanation: String,
}

impl TryFrom<RawAnalysis> for AnalysisOutcome {
    type Error = AnalysisError;

    fn try_from(raw: RawAnalysis) -> Result<Self, Self::Error> {
        Ok(Self {
            kind: BristolType::parse_code(raw.kind)?,
            volume: Volume::parse_code(raw.volume)?,
            color: StoolColor::parse_code(raw.color)?,
            explanation: raw.explanation,
        })
    }
}

/// 解析結果の出どころ。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnalysisSource {
    Remote,
    /// 解析に失敗し、仮の値を使った。
    Fallback { reason: String },
}

/// 呼び出し側に返す解析結果。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalysisReport {
    pub outcome: AnalysisOutcome,
    pub source: AnalysisSource,
}

/// 画像を解析してカテゴリを推定するtrait。
#[allow(async_fn_in_trait)]
pub trait ImageAnalyzer {
    /// 画像を1回だけ解析する。失敗しても再試行しない。
    ///
    /// # Arguments
    ///
    /// * `image` - JPEG画像の内容
    async fn analyze(&self, image: &[u8]) -> Result<AnalysisOutcome, AnalysisError>;
}

/// 補完APIと通信するためのクライアント。
///
/// # Examples
///
/// ```
/// let client = AnalysisClient::new(DEFAULT_ANALYSIS_URL);
/// let outcome = client.analyze(&image).await.unwrap();
/// ```
pub struct AnalysisClient {
    client: Client,
    api_url: String,
}

impl AnalysisClient {
    /// 新しい`AnalysisClient`を返す。
    ///
    /// # Arguments
    ///
    /// * `api_url` - 補完APIのURL
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into(),
        }
    }

    fn build_request(image: &[u8]) -> CompletionRequest {
        let data_url = format!("data:image/jpeg;base64,{}", STANDARD.encode(image));
        CompletionRequest {
            messages: vec![
                Message {
                    role: "system",
                    content: MessageContent::Text(SYSTEM_PROMPT.to_string()),
                },
                Message {
                    role: "user",
                    content: MessageContent::Parts(vec![
                        ContentPart::Text {
                            text: USER_PROMPT.to_string(),
                        },
                        ContentPart::Image { image: data_url },
                    ]),
                },
            ],
        }
    }
}

impl ImageAnalyzer for AnalysisClient {
    async fn analyze(&self, image: &[u8]) -> Result<AnalysisOutcome, AnalysisError> {
        let response = self
            .client
            .post(&self.api_url)
            .header(CONTENT_TYPE, "application/json")
            .json(&Self::build_request(image))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::Status(status));
        }

        let body = response.text().await?;
        let completion: CompletionResponse = serde_json::from_str(&body)
            .map_err(|err| AnalysisError::Parse(format!("unexpected response body: {}", err)))?;
        info!("Analysis response received from {}", self.api_url);

        parse_completion(&completion.completion)
    }
}

/// 補完テキストから解析結果を取り出す。
///
/// コードブロックなどで囲まれている場合も、最初の`{`から最後の`}`までを解析対象にする。
pub fn parse_completion(completion: &str) -> Result<AnalysisOutcome, AnalysisError> {
    let json = match (completion.find('{'), completion.rfind('}')) {
        (Some(start), Some(end)) if start < end => &completion[start..=end],
        _ => {
            return Err(AnalysisError::Parse(format!(
                "no JSON object in completion: {}",
                completion
            )))
        }
    };

    let raw: RawAnalysis = serde_json::from_str(json)
        .map_err(|err| AnalysisError::Parse(format!("invalid analysis JSON: {}", err)))?;
    AnalysisOutcome::try_from(raw)
}

/// 範囲内の値をランダムに選んだ仮の解析結果を返す。
pub fn fallback_outcome<R: Rng + ?Sized>(rng: &mut R, explanation: &str) -> AnalysisOutcome {
    AnalysisOutcome {
        kind: pick(rng),
        volume: pick(rng),
        color: pick(rng),
        explanation: explanation.to_string(),
    }
}

fn pick<C: Category, R: Rng + ?Sized>(rng: &mut R) -> C {
    C::ALL[rng.gen_range(0..C::ALL.len())]
}

/// 画像を解析し、失敗した場合は仮の解析結果を返す。
///
/// エラーは記録するだけで呼び出し側には返さない。
pub async fn analyze_with_fallback<A: ImageAnalyzer>(analyzer: &A, image: &[u8]) -> AnalysisReport {
    match analyzer.analyze(image).await {
        Ok(outcome) => AnalysisReport {
            outcome,
            source: AnalysisSource::Remote,
        },
        Err(err) => {
            warn!("Image analysis failed, using a placeholder result: {}", err);
            AnalysisReport {
                outcome: fallback_outcome(&mut rand::thread_rng(), FALLBACK_EXPLANATION),
                source: AnalysisSource::Fallback {
                    reason: err.to_string(),
                },
            }
        }
    }
}

/// 解析する画像ファイルを読み込む。
pub async fn read_image(path: &Path) -> Result<Vec<u8>, AnalysisError> {
    tokio::fs::read(path)
        .await
        .map_err(|source| AnalysisError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// バックエンドの解析エンドポイントが受け付ける入力。
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// バックエンドの解析エンドポイントの代替。入力に関係なくランダムな値を返す。
pub struct StubAnalyzer;

impl StubAnalyzer {
    pub fn respond(&self, request: &AnalyzeRequest) -> AnalysisOutcome {
        debug!(
            "Stub analysis for {} base64 characters, description: {:?}",
            request.image_base64.as_ref().map_or(0, String::len),
            request.description
        );
        fallback_outcome(&mut rand::thread_rng(), STUB_EXPLANATION)
    }
}

impl ImageAnalyzer for StubAnalyzer {
    async fn analyze(&self, image: &[u8]) -> Result<AnalysisOutcome, AnalysisError> {
        let request = AnalyzeRequest {
            image_base64: Some(STANDARD.encode(image)),
            description: None,
        };
        Ok(self.respond(&request))
    }
}
