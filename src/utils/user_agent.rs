//! User-agent classification.
//!
//! Ordered [`DetectorSet`]s recognize clients a general browser parser
//! misreports (in-app browsers, bots, CLIs, email clients, media players,
//! HTTP libraries). Anything they do not claim falls through to `woothee`.

use std::fmt;

use regex::Regex;
use woothee::parser::Parser;

/// woothee's placeholder for fields it could not determine.
const UNKNOWN: &str = "UNKNOWN";

/// Client family, stored in the `browserType` log field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrowserType {
    InApp,
    Crawler,
    Cli,
    Email,
    MediaPlayer,
    Library,
    Browser,
}

impl BrowserType {
    pub fn as_str(self) -> &'static str {
        match self {
            BrowserType::InApp => "inapp",
            BrowserType::Crawler => "crawler",
            BrowserType::Cli => "cli",
            BrowserType::Email => "email",
            BrowserType::MediaPlayer => "mediaplayer",
            BrowserType::Library => "library",
            BrowserType::Browser => "browser",
        }
    }
}

impl fmt::Display for BrowserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Device form factor, stored in the `deviceType` log field.
///
/// Desktops carry no device type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceType {
    Mobile,
    Tablet,
    Console,
}

impl DeviceType {
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceType::Mobile => "mobile",
            DeviceType::Tablet => "tablet",
            DeviceType::Console => "console",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client patterns sharing one [`BrowserType`]. First matching pattern wins.
#[derive(Debug, Clone)]
pub struct DetectorSet {
    kind: BrowserType,
    detectors: Vec<(Regex, String)>,
}

impl DetectorSet {
    /// Compiles `patterns` as case-insensitive `(regex, client name)` pairs.
    ///
    /// # Errors
    ///
    /// Returns the first pattern that fails to compile.
    pub fn new(kind: BrowserType, patterns: &[(&str, &str)]) -> Result<Self, regex::Error> {
        let detectors = patterns
            .iter()
            .map(|(pattern, name)| Ok((Regex::new(&format!("(?i){pattern}"))?, name.to_string())))
            .collect::<Result<Vec<_>, regex::Error>>()?;

        Ok(Self { kind, detectors })
    }

    pub fn kind(&self) -> BrowserType {
        self.kind
    }

    fn detect(&self, ua: &str) -> Option<&str> {
        self.detectors
            .iter()
            .find(|(re, _)| re.is_match(ua))
            .map(|(_, name)| name.as_str())
    }
}

/// Device model patterns with their form factor.
#[derive(Debug, Clone)]
struct DeviceDetector {
    pattern: Regex,
    model: String,
    device_type: DeviceType,
}

/// Classification result. Unknown parts are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UaInfo {
    pub os: Option<String>,
    pub browser: Option<String>,
    pub browser_type: Option<BrowserType>,
    pub device: Option<String>,
    pub device_type: Option<DeviceType>,
}

const IN_APP: &[(&str, &str)] = &[
    (r"FBAN/|FBAV/|FB_IAB/", "Facebook"),
    (r"Instagram", "Instagram"),
    (r"MicroMessenger/", "WeChat"),
    (r"\bLine/", "Line"),
    (r"musical_ly|BytedanceWebview|TikTok", "TikTok"),
    (r"Twitter for (?:iPhone|Android|iPad)", "Twitter"),
    (r"LinkedInApp", "LinkedIn"),
    (r"Snapchat", "Snapchat"),
    (r"Pinterest/", "Pinterest"),
    (r"\bQQ/", "QQ"),
    (r"DingTalk", "DingTalk"),
];

const BOTS: &[(&str, &str)] = &[
    (r"Googlebot", "Googlebot"),
    (r"bingbot", "Bingbot"),
    (r"YandexBot", "YandexBot"),
    (r"DuckDuckBot", "DuckDuckBot"),
    (r"Baiduspider", "Baiduspider"),
    (r"Applebot", "Applebot"),
    (r"facebookexternalhit|facebookcatalog", "Facebook Crawler"),
    (r"Twitterbot", "Twitterbot"),
    (r"Slackbot", "Slackbot"),
    (r"Discordbot", "Discordbot"),
    (r"TelegramBot", "TelegramBot"),
    (r"LinkedInBot", "LinkedInBot"),
    (r"WhatsApp/", "WhatsApp"),
    (r"GPTBot", "GPTBot"),
    (r"ClaudeBot", "ClaudeBot"),
];

const CLIS: &[(&str, &str)] = &[
    (r"^curl/", "curl"),
    (r"^Wget/", "Wget"),
    (r"^HTTPie/", "HTTPie"),
    (r"^aria2/", "aria2"),
    (r"WindowsPowerShell/", "PowerShell"),
    (r"^Lynx/", "Lynx"),
];

const EMAIL: &[(&str, &str)] = &[
    (r"Thunderbird/", "Thunderbird"),
    (r"Microsoft Outlook", "Outlook"),
    (r"YahooMailProxy", "Yahoo Mail"),
    (r"GoogleImageProxy", "Gmail"),
    (r"Airmail", "Airmail"),
];

const MEDIA_PLAYERS: &[(&str, &str)] = &[
    (r"\bVLC/", "VLC"),
    (r"\bmpv\b", "mpv"),
    (r"iTunes/", "iTunes"),
    (r"Spotify/", "Spotify"),
    (r"Winamp", "Winamp"),
];

const LIBRARIES: &[(&str, &str)] = &[
    (r"python-requests/", "Python Requests"),
    (r"Python-urllib/", "Python urllib"),
    (r"aiohttp/", "aiohttp"),
    (r"Go-http-client/", "Go HTTP Client"),
    (r"axios/", "Axios"),
    (r"node-fetch", "node-fetch"),
    (r"okhttp/", "OkHttp"),
    (r"Apache-HttpClient/", "Apache HttpClient"),
    (r"^Java/", "Java"),
    (r"reqwest/", "reqwest"),
    (r"PostmanRuntime/", "Postman"),
];

const EXTRA_DEVICES: &[(&str, &str, DeviceType)] = &[
    (r"\biPad\b", "iPad", DeviceType::Tablet),
    (r"Kindle|\bSilk/", "Kindle", DeviceType::Tablet),
    (r"\bSM-[TX]\d{3}", "Galaxy Tab", DeviceType::Tablet),
    (r"\bSM-[AGNS]\d{3}", "Galaxy", DeviceType::Mobile),
    (r"\bPixel \d+", "Pixel", DeviceType::Mobile),
    (r"\biPhone\b", "iPhone", DeviceType::Mobile),
    (r"PlayStation", "PlayStation", DeviceType::Console),
    (r"Xbox", "Xbox", DeviceType::Console),
    (r"Nintendo", "Nintendo", DeviceType::Console),
];

/// Classifies user-agent strings into the OS, browser and device log fields.
#[derive(Debug, Clone)]
pub struct UserAgentClassifier {
    sets: Vec<DetectorSet>,
    devices: Vec<DeviceDetector>,
}

impl UserAgentClassifier {
    /// Builds a classifier from detector sets consulted in order.
    pub fn new(sets: Vec<DetectorSet>) -> Self {
        Self {
            sets,
            devices: Vec::new(),
        }
    }

    /// The built-in sets: in-app browsers, bots, CLIs, email clients, media
    /// players, HTTP libraries, plus extra device models.
    pub fn standard() -> Self {
        let sets = [
            (BrowserType::InApp, IN_APP),
            (BrowserType::Crawler, BOTS),
            (BrowserType::Cli, CLIS),
            (BrowserType::Email, EMAIL),
            (BrowserType::MediaPlayer, MEDIA_PLAYERS),
            (BrowserType::Library, LIBRARIES),
        ]
        .into_iter()
        .map(|(kind, patterns)| {
            DetectorSet::new(kind, patterns).expect("built-in user agent patterns are valid")
        })
        .collect();

        let devices = EXTRA_DEVICES
            .iter()
            .map(|(pattern, model, device_type)| DeviceDetector {
                pattern: Regex::new(pattern).expect("built-in device patterns are valid"),
                model: model.to_string(),
                device_type: *device_type,
            })
            .collect();

        Self { sets, devices }
    }

    /// Appends a detector set consulted after the existing ones.
    pub fn push_set(&mut self, set: DetectorSet) {
        self.sets.push(set);
    }

    /// Classifies a raw user-agent string.
    pub fn classify(&self, ua: &str) -> UaInfo {
        let ua = ua.trim();
        if ua.is_empty() {
            return UaInfo::default();
        }

        let parser = Parser::new();
        let parsed = parser.parse(ua).unwrap_or_default();
        let known = |value: &str| (!value.is_empty() && value != UNKNOWN).then(|| value.to_string());

        let (browser, browser_type) = match self
            .sets
            .iter()
            .find_map(|set| set.detect(ua).map(|name| (name.to_string(), set.kind())))
        {
            Some((name, kind)) => (Some(name), Some(kind)),
            None => match known(parsed.name) {
                Some(name) if parsed.category == "crawler" => (Some(name), Some(BrowserType::Crawler)),
                Some(name) => (Some(name), Some(BrowserType::Browser)),
                None => (None, None),
            },
        };

        let (device, device_type) = match self.devices.iter().find(|d| d.pattern.is_match(ua)) {
            Some(d) => (Some(d.model.clone()), Some(d.device_type)),
            None => (None, device_type_for_category(parsed.category)),
        };

        UaInfo {
            os: known(parsed.os),
            browser,
            browser_type,
            device,
            device_type,
        }
    }
}

impl Default for UserAgentClassifier {
    fn default() -> Self {
        Self::standard()
    }
}

fn device_type_for_category(category: &str) -> Option<DeviceType> {
    match category {
        "smartphone" | "mobilephone" => Some(DeviceType::Mobile),
        "appliance" => Some(DeviceType::Console),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
    const SAFARI_IPAD: &str = "Mozilla/5.0 (iPad; CPU OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
    const GOOGLEBOT: &str =
        "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";
    const INSTAGRAM: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Mobile/15E148 Instagram 309.0.0.0 (iPhone14,2; iOS 17_0; en_US)";

    fn classify(ua: &str) -> UaInfo {
        UserAgentClassifier::standard().classify(ua)
    }

    #[test]
    fn test_desktop_chrome() {
        let info = classify(CHROME_WINDOWS);
        assert_eq!(info.browser.as_deref(), Some("Chrome"));
        assert_eq!(info.browser_type, Some(BrowserType::Browser));
        assert_eq!(info.os.as_deref(), Some("Windows 10"));
        assert_eq!(info.device_type, None);
        assert_eq!(info.device, None);
    }

    #[test]
    fn test_iphone_safari_is_mobile() {
        let info = classify(SAFARI_IPHONE);
        assert_eq!(info.browser.as_deref(), Some("Safari"));
        assert_eq!(info.browser_type, Some(BrowserType::Browser));
        assert_eq!(info.device.as_deref(), Some("iPhone"));
        assert_eq!(info.device_type, Some(DeviceType::Mobile));
    }

    #[test]
    fn test_ipad_is_tablet() {
        let info = classify(SAFARI_IPAD);
        assert_eq!(info.device.as_deref(), Some("iPad"));
        assert_eq!(info.device_type, Some(DeviceType::Tablet));
    }

    #[test]
    fn test_bot_detected_before_browser_parser() {
        let info = classify(GOOGLEBOT);
        assert_eq!(info.browser.as_deref(), Some("Googlebot"));
        assert_eq!(info.browser_type, Some(BrowserType::Crawler));
    }

    #[test]
    fn test_in_app_browser_wins_over_safari() {
        let info = classify(INSTAGRAM);
        assert_eq!(info.browser.as_deref(), Some("Instagram"));
        assert_eq!(info.browser_type, Some(BrowserType::InApp));
        assert_eq!(info.device_type, Some(DeviceType::Mobile));
    }

    #[test]
    fn test_cli_and_library_clients() {
        let curl = classify("curl/8.4.0");
        assert_eq!(curl.browser.as_deref(), Some("curl"));
        assert_eq!(curl.browser_type, Some(BrowserType::Cli));

        let requests = classify("python-requests/2.31.0");
        assert_eq!(requests.browser.as_deref(), Some("Python Requests"));
        assert_eq!(requests.browser_type, Some(BrowserType::Library));
    }

    #[test]
    fn test_email_and_media_player_clients() {
        let thunderbird = classify(
            "Mozilla/5.0 (X11; Linux x86_64; rv:115.0) Gecko/20100101 Thunderbird/115.3.1",
        );
        assert_eq!(thunderbird.browser_type, Some(BrowserType::Email));

        let vlc = classify("VLC/3.0.18 LibVLC/3.0.18");
        assert_eq!(vlc.browser.as_deref(), Some("VLC"));
        assert_eq!(vlc.browser_type, Some(BrowserType::MediaPlayer));
    }

    #[test]
    fn test_empty_and_garbage_agents_yield_nothing() {
        assert_eq!(classify(""), UaInfo::default());
        assert_eq!(classify("   "), UaInfo::default());

        let info = classify("zzzz-not-a-browser");
        assert_eq!(info.browser, None);
        assert_eq!(info.browser_type, None);
        assert_eq!(info.os, None);
    }

    #[test]
    fn test_custom_set_is_consulted_in_order() {
        let mut classifier = UserAgentClassifier::new(Vec::new());
        classifier.push_set(DetectorSet::new(BrowserType::Library, &[("^sink-probe/", "Probe")]).unwrap());

        let info = classifier.classify("sink-probe/1.0");
        assert_eq!(info.browser.as_deref(), Some("Probe"));
        assert_eq!(info.browser_type, Some(BrowserType::Library));
    }

    #[test]
    fn test_detector_set_rejects_bad_pattern() {
        assert!(DetectorSet::new(BrowserType::Cli, &[("([a-z", "bad")]).is_err());
    }

    #[test]
    fn test_type_strings() {
        assert_eq!(BrowserType::MediaPlayer.to_string(), "mediaplayer");
        assert_eq!(BrowserType::InApp.as_str(), "inapp");
        assert_eq!(DeviceType::Console.as_str(), "console");
    }
}
