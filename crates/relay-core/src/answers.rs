//! Fixed user-facing answers returned in place of errors.

pub const TEST_RESPONSE: &str = "This is a test response from the backend.";

pub const NOT_CONFIGURED: &str =
    "Sorry, the AI service is not configured properly. Please try again later.";

pub const API_ERROR: &str = "Sorry, I couldn't process your request. There was an API error.";

pub const GENERIC_FAILURE: &str = "Sorry, I encountered an error while processing your request.";

pub const UNEXPECTED_FORMAT: &str =
    "I received a response from the AI service, but it wasn't in the expected format.";

pub const UNEXTRACTABLE: &str =
    "I processed your request, but couldn't extract the text response.";

pub const TIMED_OUT: &str = "Your request is taking longer than expected. Please try again later.";

pub const MISSING_TEXT: &str = "Missing 'text' in request body";

pub const SERVER_ERROR: &str = "An unexpected error occurred on the server. Please try again later.";
