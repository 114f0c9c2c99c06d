pub const SPECIALIST_PREAMBLE: &str = "You are an expert assistant specialized in Argo floats, oceanography, and marine data. You must ONLY provide answers related to Argo floats, oceans, seas, or marine science.";

pub const REFUSAL_REPLY: &str =
    "Sorry, I can only provide information related to Argo floats, oceans, seas, and marine science.";

pub const TEXT_SYSTEM_MESSAGE: &str = "You are an expert assistant specialized in Argo floats, oceanography, and marine data. 

For greetings and opening statements (hi, hello, how are you, what can you do, etc.), respond warmly and introduce yourself as a marine science expert, then invite the user to ask about Argo floats, oceans, seas, or marine science topics.

For all other queries, you must ONLY provide answers related to Argo floats, oceans, seas, or marine science. Always focus on accurate, concise, and domain-specific responses. Do NOT generate any general or unrelated information.";

pub const CHART_MAX_TOKENS: u32 = 600;
pub const CHART_TEMPERATURE: f32 = 0.3;
pub const TEXT_MAX_TOKENS: u32 = 200;
pub const TEXT_TEMPERATURE: f32 = 0.5;

pub fn map_prompt(user_message: &str) -> String {
    format!(
        "{SPECIALIST_PREAMBLE}

The user asked: \"{user_message}\". 
Provide ARGO float locations with specific coordinates. 
Include exact latitude and longitude coordinates (e.g., \"latitude: 35.5, longitude: -120.3\"), 
mention specific ocean regions (Pacific, Atlantic, Indian, Arctic, Southern). 
Do NOT provide any description or explanation, only the location data."
    )
}

/// Asks for one labeled line per observation so the field extractor can
/// recover them.
pub fn chart_prompt(user_message: &str) -> String {
    format!(
        "{SPECIALIST_PREAMBLE}

User query: \"{user_message}\".
Provide oceanographic data with specific values in a flat, readable list.
Use this style so it's easy to parse:
Temperature: 15.2°C at 100m depth, Salinity: 35.1 PSU, Latitude: 40.5, Longitude: -120.3, Date: 2023-01-01
Temperature: 12.8°C at 500m depth, Salinity: 34.8 PSU, Latitude: 40.6, Longitude: -120.2, Date: 2023-01-02
Provide 15-50 lines if possible. Do NOT truncate or summarize the data lines.
Do NOT provide any description or explanation, only the data list."
    )
}
