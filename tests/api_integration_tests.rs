use meal_journal::api_connection::{
    connection::ApiConnectionError,
    endpoints::{ChatCompletionRequest, ChatMessage, MessageContent, Provider},
};
use meal_journal::config::{AnalyzerConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
use meal_journal::meal_analyzer::{analyze_meal, ImageSource, MealAnalysisRequest};
use dotenv::dotenv;
use std::env;
use std::io::Write;

const SAMPLE_MEAL_IMAGE: &str = "https://media.istockphoto.com/id/526149515/photo/nasi-lemak-malaysian-cuisine.jpg?s=612x612&w=0&k=20&c=XiJE-q-zUMj8KLEmrDnEWHwVgaP-VPhYaOoWUgnR6UY=";

fn setup_test_environment() {
    dotenv().ok();
}

#[tokio::test]
async fn test_missing_api_key_error() {
    setup_test_environment();
    let provider =
        Provider::open_ai_compatible("THIS_KEY_SHOULD_NOT_EXIST_IN_ENV_ABXYZ", DEFAULT_BASE_URL);
    let request = ChatCompletionRequest {
        model: DEFAULT_MODEL.to_string(),
        messages: vec![ChatMessage {
            role: "user".to_string(),
            content: MessageContent::Text("Hello".to_string()),
        }],
        tools: None,
        temperature: None,
        max_tokens: None,
    };
    let result = provider.call_chat_completion(request).await;
    assert!(matches!(result, Err(ApiConnectionError::MissingApiKey(_))));
    if let Err(ApiConnectionError::MissingApiKey(key_name)) = result {
        assert_eq!(key_name, "THIS_KEY_SHOULD_NOT_EXIST_IN_ENV_ABXYZ");
    }
}

#[tokio::test]
async fn test_analyze_meal_reports_missing_key_before_any_request() {
    setup_test_environment();
    let config = AnalyzerConfig {
        api_key_env_var: "ANOTHER_KEY_THAT_IS_NOT_SET_QWERTY".to_string(),
        ..AnalyzerConfig::default()
    };
    let request = MealAnalysisRequest {
        image: ImageSource::from_url(SAMPLE_MEAL_IMAGE),
        conditions: vec!["gout".to_string()],
        notes: None,
    };
    let result = analyze_meal(&request, &config).await;
    assert!(matches!(result, Err(ApiConnectionError::MissingApiKey(_))));
}

#[tokio::test]
async fn test_local_image_is_inlined_as_data_url() {
    let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
    file.write_all(b"\x89PNG").unwrap();

    let image = ImageSource::resolve(file.path().to_str().unwrap()).await.unwrap();
    assert_eq!(image.url(), "data:image/png;base64,iVBORw==");
}

#[tokio::test]
#[ignore]
async fn test_successful_meal_analysis() {
    setup_test_environment();
    let config = AnalyzerConfig::from_env();
    if env::var(&config.api_key_env_var).is_err() {
        println!(
            "Skipping test_successful_meal_analysis: {} not set.",
            config.api_key_env_var
        );
        return;
    }

    let request = MealAnalysisRequest {
        image: ImageSource::from_url(SAMPLE_MEAL_IMAGE),
        conditions: vec!["gout".to_string(), "diabetes".to_string()],
        notes: Some("Extra sambal, no cucumber".to_string()),
    };
    let result = analyze_meal(&request, &config).await;
    assert!(result.is_ok(), "Meal analysis failed: {:?}", result.err());
    let meal = result.unwrap();
    assert!(meal.calories > 0.0);
    assert!(!meal.ingredients.is_empty());
}

#[tokio::test]
#[ignore]
async fn test_api_error_with_invalid_key() {
    setup_test_environment();

    const INVALID_KEY_ENV_NAME_FOR_THIS_TEST: &str = "ENV_VAR_WITH_BAD_KEY_VALUE";

    unsafe {
        std::env::set_var(
            INVALID_KEY_ENV_NAME_FOR_THIS_TEST,
            "this_is_a_deliberately_bad_api_key_string_for_testing",
        );
    }

    let provider =
        Provider::open_ai_compatible(INVALID_KEY_ENV_NAME_FOR_THIS_TEST, DEFAULT_BASE_URL);
    let request = ChatCompletionRequest {
        model: DEFAULT_MODEL.to_string(),
        messages: vec![ChatMessage {
            role: "user".to_string(),
            content: MessageContent::Text(
                "This call should fail due to invalid key.".to_string(),
            ),
        }],
        tools: None,
        temperature: None,
        max_tokens: None,
    };

    let result = provider.call_chat_completion(request).await;
    assert!(
        matches!(result, Err(ApiConnectionError::ApiError { .. })),
        "Expected ApiError, got {:?}",
        result
    );
    if let Err(ApiConnectionError::ApiError { status, .. }) = result {
        assert_eq!(status, reqwest::StatusCode::UNAUTHORIZED);
    }

    unsafe {
        std::env::remove_var(INVALID_KEY_ENV_NAME_FOR_THIS_TEST);
    }
}
