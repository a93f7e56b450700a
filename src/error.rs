use thiserror::Error;

#[derive(Error, Debug)]
pub enum CropError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("APIキーが設定されていません。`insta-crop config --set-api-key YOUR_KEY` または GEMINI_API_KEY で設定してください")]
    MissingApiKey,

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("画像のダウンロードに失敗: {0}")]
    ImageFetch(String),

    #[error("画像読み込みエラー: {0}")]
    ImageLoad(String),

    #[error("API呼び出しエラー: {0}")]
    ApiCall(String),

    #[error("APIレスポンスのパースに失敗: {0}")]
    ApiParse(String),

    #[error("タイムアウト: {0}")]
    Timeout(String),

    #[error("画像エンコードエラー: {0}")]
    Encode(String),

    #[error("画像が見つかりません: {0}")]
    NoImagesFound(String),

    #[error("CLI実行エラー: {0}")]
    CliExecution(String),

    #[error("並列処理エラー: {0}")]
    Task(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] insta_crop_common::Error),
}

pub type Result<T> = std::result::Result<T, CropError>;
