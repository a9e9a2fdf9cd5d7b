use crate::model::history::HistoryEntry;

/// History entries quoted back to the backend on follow-up turns.
pub const PROMPT_HISTORY_ENTRIES: usize = 2;

/// Builds the instruction text sent to the backend.
/// This struct only formats text: no parsing, no networking, no state.
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn build(
        topic: &str,
        history: &[HistoryEntry],
        player_action: &str,
        is_first_turn: bool,
    ) -> String {
        let mut prompt = String::new();

        push_style_contract(&mut prompt);
        push_output_format(&mut prompt);
        push_topic(&mut prompt, topic);

        if is_first_turn {
            push_opening_task(&mut prompt);
        } else {
            push_recent_context(&mut prompt, history);
            push_consequence_task(&mut prompt, player_action);
        }

        push_reminder(&mut prompt);

        prompt
    }
}

fn push_style_contract(prompt: &mut String) {
    prompt.push_str(
        "You are the narrator of an interactive text adventure.\n\n\
Style Rules:\n\
- Write in second person (\"you\").\n\
- Write 3 to 6 sentences, between 50 and 120 words.\n\
- End on a moment that invites a decision.\n\
- Never decide what the player does next.\n\n\
Choice Rules:\n\
- Offer exactly 4 choices.\n\
- Every choice is distinct from the others.\n\
- Every choice is 2 to 6 words and starts with a verb.\n\n",
    );
}

fn push_output_format(prompt: &mut String) {
    prompt.push_str(
        "Output Format:\n\
Respond with ONLY one JSON object. No markdown, no commentary.\n\
{\"story\": \"<narration>\", \"choices\": [\
{\"id\": \"1\", \"text\": \"<choice>\"}, \
{\"id\": \"2\", \"text\": \"<choice>\"}, \
{\"id\": \"3\", \"text\": \"<choice>\"}, \
{\"id\": \"4\", \"text\": \"<choice>\"}]}\n\n",
    );
}

fn push_topic(prompt: &mut String, topic: &str) {
    prompt.push_str("TOPIC:\n");
    prompt.push_str(topic.trim());
    prompt.push_str("\n\n");
}

fn push_recent_context(prompt: &mut String, history: &[HistoryEntry]) {
    let skip = history.len().saturating_sub(PROMPT_HISTORY_ENTRIES);
    let recent = &history[skip..];

    if recent.is_empty() {
        return;
    }

    prompt.push_str("RECENT CONTEXT:\n");
    for entry in recent {
        prompt.push_str(&entry.serialize());
        prompt.push_str("\n\n");
    }
}

fn push_opening_task(prompt: &mut String) {
    prompt.push_str(
        "TASK:\n\
Write the opening scene of the adventure. Introduce where the player is \
and what is at stake, then offer the first 4 choices.\n\n",
    );
}

fn push_consequence_task(prompt: &mut String, player_action: &str) {
    prompt.push_str("PLAYER ACTION:\n");
    prompt.push_str(player_action.trim());
    prompt.push_str("\n\n");

    prompt.push_str(
        "TASK:\n\
Describe the immediate consequence of the player's action and how the \
scene changes, then offer 4 new choices.\n\n",
    );
}

fn push_reminder(prompt: &mut String) {
    prompt.push_str("Reminder: reply with the JSON object only.\n");
}
