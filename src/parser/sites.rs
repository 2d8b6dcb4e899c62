/// A video site whose pages the parse lines understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoSite {
    pub name: &'static str,
    pub domain: &'static str,
    pub home: &'static str,
}

pub const SUPPORTED_SITES: &[VideoSite] = &[
    VideoSite { name: "iQIYI", domain: "iqiyi.com", home: "https://www.iqiyi.com" },
    VideoSite { name: "Tencent Video", domain: "v.qq.com", home: "https://v.qq.com" },
    VideoSite { name: "Youku", domain: "youku.com", home: "https://www.youku.com" },
    VideoSite { name: "Mango TV", domain: "mgtv.com", home: "https://www.mgtv.com" },
    VideoSite { name: "Bilibili", domain: "bilibili.com", home: "https://www.bilibili.com" },
    VideoSite { name: "Sohu Video", domain: "tv.sohu.com", home: "https://tv.sohu.com" },
    VideoSite { name: "PPTV", domain: "pptv.com", home: "https://www.pptv.com" },
    VideoSite { name: "1905", domain: "1905.com", home: "https://www.1905.com" },
];

/// Finds the supported site a page URL belongs to.
pub fn site_for(url: &str) -> Option<&'static VideoSite> {
    let lower = url.to_ascii_lowercase();
    SUPPORTED_SITES.iter().find(|site| lower.contains(site.domain))
}

/// Looks a site up by 1-based position, name or domain (case-insensitive).
pub fn find_site(selector: &str) -> Option<&'static VideoSite> {
    let selector = selector.trim();
    if let Ok(index) = selector.parse::<usize>() {
        return index.checked_sub(1).and_then(|i| SUPPORTED_SITES.get(i));
    }
    SUPPORTED_SITES.iter().find(|site| {
        site.name.eq_ignore_ascii_case(selector) || site.domain.eq_ignore_ascii_case(selector)
    })
}
