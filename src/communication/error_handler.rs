use crate::commands::CommandError;
use crate::communication::telegram::Response;

pub fn map_command_error_to_user_message(error: &CommandError) -> String {
    match error {
        CommandError::Database(_) => {
            "😔 Something went wrong while processing the command. Please try again later"
                .to_string()
        }
    }
}

pub fn create_error_response(error: &CommandError) -> Response {
    Response {
        text: map_command_error_to_user_message(error),
    }
}
