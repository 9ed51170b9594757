//! Instruction text for brick generation

use crate::core::config::InstructionFormat;
use crate::structure::BrickLibrary;

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Word the generator replies with once the structure is complete
pub const END_MARKER: &str = "DONE";

/// Wrap a caption in the instruction template the generator expects
pub fn create_instruction(caption: &str, library: &BrickLibrary, format: InstructionFormat) -> String {
    let base = format!(
        "Create a LEGO model of the input. Format your response as a list of bricks: \
         <brick dimensions> <brick position>, where the brick position is (x,y,z).\n\
         Allowed brick dimensions are {}.\n\
         All bricks are 1 unit tall.\n\n\
         ### Input:\n\
         {}",
        library.allowed_dimensions(),
        caption
    );

    match format {
        InstructionFormat::Standard => base,
        InstructionFormat::ZeroShot => format!(
            "{}\n\n\
             Each line of your output should be a LEGO brick in the format \
             `<brick dimensions> <brick position>`. For example:\n\
             2x4 (2,1,0)\n\
             DO NOT output any other text. Only output LEGO bricks. \
             The first brick should have a z-coordinate of 0.",
            base
        ),
    }
}

/// User message asking for exactly one more brick after `transcript`
pub fn continuation_request(instruction: &str, transcript: &str) -> String {
    let so_far = if transcript.is_empty() {
        "(none yet)\n"
    } else {
        transcript
    };
    format!(
        "{}\n\n### Bricks so far:\n{}\n\
         Reply with the next brick only, as a single line. \
         If the model is complete, reply with {}.",
        instruction, so_far, END_MARKER
    )
}
