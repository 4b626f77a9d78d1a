//! In-page extractor scripts, embedded as expressions.
//!
//! Each script is a self-invoking expression returning serializable data.
//! Every DOM access is wrapped so a hostile or half-loaded page degrades to
//! empty output instead of throwing.

use crate::renderer::ExtractorId;

/// Script for a given extractor id.
pub fn script_for(extractor: ExtractorId) -> &'static str {
    match extractor {
        ExtractorId::Content => CONTENT_JS,
        ExtractorId::Images => IMAGES_JS,
        ExtractorId::UiColors => UI_COLORS_JS,
        ExtractorId::Typography => TYPOGRAPHY_JS,
    }
}

/// No-op shim for bundler helper identifiers. Some sites emit inline snippets
/// referencing these before their bundles load; defining harmless stand-ins
/// keeps unrelated ReferenceErrors from aborting our evaluations.
pub const SHIM_JS: &str = r##"
(() => {
  const names = ['webpackJsonp', '__webpack_require__', 'regeneratorRuntime',
                 'define', 'requirejs', 'dataLayer', 'gtag', 'fbq', 'analytics'];
  for (const n of names) {
    try {
      if (typeof window[n] === 'undefined') {
        window[n] = (n === 'dataLayer') ? [] : function () {};
      }
    } catch (e) { /* frozen window property */ }
  }
  return true;
})()
"##;

const CONTENT_JS: &str = r##"
(() => {
  const body = document.body ? document.body.cloneNode(true) : document.createElement('body');
  for (const sel of ['nav', 'footer', 'script', 'style', 'noscript', 'iframe']) {
    try { body.querySelectorAll(sel).forEach(n => n.remove()); } catch (e) {}
  }
  const bodyText = (body.textContent || '').replace(/\s+/g, ' ').trim().slice(0, 40000);

  const pick = sel => {
    try {
      return Array.from(document.querySelectorAll(sel))
        .map(el => (el.textContent || '').replace(/\s+/g, ' ').trim())
        .filter(Boolean)
        .slice(0, 20);
    } catch (e) { return []; }
  };
  const metaByName = name => {
    const el = document.querySelector('meta[name="' + name + '"]');
    return el ? (el.getAttribute('content') || '') : '';
  };
  const og = prop => {
    const el = document.querySelector('meta[property="' + prop + '"]');
    return el ? el.getAttribute('content') : null;
  };
  let links = [];
  try {
    links = Array.from(document.querySelectorAll('a[href]'))
      .map(a => a.href)
      .filter(h => h && !h.startsWith('javascript:') && !h.startsWith('mailto:') && !h.startsWith('tel:'))
      .slice(0, 300);
  } catch (e) {}

  return {
    title: document.title || '',
    metaDescription: metaByName('description'),
    h1s: pick('h1'),
    h2s: pick('h2'),
    h3s: pick('h3'),
    bodyText,
    links,
    openGraph: {
      title: og('og:title'),
      description: og('og:description'),
      image: og('og:image'),
      siteName: og('og:site_name')
    }
  };
})()
"##;

const IMAGES_JS: &str = r##"
(() => {
  const vh = window.innerHeight || 800;
  const out = [];

  const context = el => {
    let inHeader = false, inFooter = false;
    const texts = [], attrs = [];
    let node = el;
    for (let i = 0; node && i < 12; i++) {
      const tag = (node.tagName || '').toLowerCase();
      if (tag === 'header' || tag === 'nav') inHeader = true;
      if (tag === 'footer') inFooter = true;
      if (node.getAttribute) {
        attrs.push(typeof node.className === 'string' ? node.className : '',
                   node.id || '',
                   node.getAttribute('aria-label') || '');
        try {
          const h = node.querySelector(':scope > h1, :scope > h2, :scope > h3, :scope > h4');
          if (h) texts.push((h.textContent || '').slice(0, 120));
        } catch (e) {}
      }
      node = node.parentElement;
    }
    let top = null;
    try {
      const r = el.getBoundingClientRect();
      top = r.top + (window.scrollY || 0);
    } catch (e) {}
    return {
      inHeader, inFooter,
      ancestorText: texts.join(' ').slice(0, 400),
      ancestorAttrs: attrs.join(' ').slice(0, 400),
      top,
      viewportHeight: vh
    };
  };

  // Inline SVG (strongest logo source). Serialized so synthesis can keep the
  // markup; capped to keep payloads sane.
  try {
    document.querySelectorAll('svg').forEach((svg, i) => {
      if (i >= 20) return;
      let url = null;
      try {
        const markup = new XMLSerializer().serializeToString(svg);
        if (markup.length < 8000) {
          url = 'data:image/svg+xml;utf8,' + encodeURIComponent(markup);
        }
      } catch (e) {}
      if (!url) return;
      let w = null, h = null;
      try {
        const r = svg.getBoundingClientRect();
        w = Math.round(r.width) || null;
        h = Math.round(r.height) || null;
      } catch (e) {}
      out.push(Object.assign({
        url,
        alt: svg.getAttribute('aria-label') || '',
        title: (svg.querySelector('title') || {}).textContent || '',
        width: w, height: h,
        sourceType: 'inline_svg'
      }, context(svg)));
    });
  } catch (e) {}

  // CSS background / mask images.
  try {
    let scanned = 0;
    for (const el of document.querySelectorAll('*')) {
      if (scanned++ > 1500) break;
      const cs = window.getComputedStyle(el);
      const sources = [cs.backgroundImage, cs.maskImage || cs.webkitMaskImage];
      for (const src of sources) {
        if (!src || src === 'none') continue;
        const m = src.match(/url\(["']?([^"')]+)["']?\)/);
        if (!m) continue;
        let abs = m[1];
        try { abs = new URL(m[1], document.baseURI).href; } catch (e) {}
        let w = null, h = null;
        try {
          const r = el.getBoundingClientRect();
          w = Math.round(r.width) || null;
          h = Math.round(r.height) || null;
        } catch (e) {}
        out.push(Object.assign({
          url: abs,
          alt: el.getAttribute('aria-label') || '',
          title: el.getAttribute('title') || '',
          width: w, height: h,
          sourceType: 'css_background'
        }, context(el)));
        break;
      }
    }
  } catch (e) {}

  // HTML <img>.
  try {
    document.querySelectorAll('img[src]').forEach((img, i) => {
      if (i >= 80) return;
      out.push(Object.assign({
        url: img.currentSrc || img.src,
        alt: img.getAttribute('alt') || '',
        title: img.getAttribute('title') || '',
        width: img.naturalWidth || img.width || null,
        height: img.naturalHeight || img.height || null,
        sourceType: 'html_img'
      }, context(img)));
    });
  } catch (e) {}

  // Open Graph image.
  try {
    const og = document.querySelector('meta[property="og:image"]');
    if (og && og.getAttribute('content')) {
      out.push({
        url: og.getAttribute('content'),
        alt: '', title: '', width: null, height: null,
        sourceType: 'open_graph',
        inHeader: false, inFooter: false,
        ancestorText: '', ancestorAttrs: '',
        top: null, viewportHeight: vh
      });
    }
  } catch (e) {}

  // Favicons.
  try {
    document.querySelectorAll('link[rel~="icon"], link[rel="apple-touch-icon"]').forEach(l => {
      if (!l.href) return;
      const sizes = (l.getAttribute('sizes') || '').match(/(\d+)x(\d+)/);
      out.push({
        url: l.href,
        alt: '', title: '',
        width: sizes ? parseInt(sizes[1], 10) : null,
        height: sizes ? parseInt(sizes[2], 10) : null,
        sourceType: 'favicon',
        inHeader: false, inFooter: false,
        ancestorText: '', ancestorAttrs: '',
        top: null, viewportHeight: vh
      });
    });
  } catch (e) {}

  return out.slice(0, 150);
})()
"##;

const UI_COLORS_JS: &str = r##"
(() => {
  const votes = [];
  const push = (value, weight) => {
    if (value && String(value).trim()) votes.push({ value: String(value).trim(), weight });
  };

  // Brand-like CSS custom properties carry the strongest signal.
  try {
    const rootStyle = window.getComputedStyle(document.documentElement);
    const props = ['--primary', '--primary-color', '--brand', '--brand-color',
                   '--accent', '--accent-color', '--secondary', '--secondary-color',
                   '--color-primary', '--color-secondary', '--color-accent',
                   '--color-brand', '--theme-color', '--main-color'];
    for (const p of props) push(rootStyle.getPropertyValue(p), 10);
  } catch (e) {}

  try {
    const theme = document.querySelector('meta[name="theme-color"]');
    if (theme) push(theme.getAttribute('content'), 9);
  } catch (e) {}

  const sample = (sel, weight, props) => {
    try {
      document.querySelectorAll(sel).forEach((el, i) => {
        if (i >= 6) return;
        const cs = window.getComputedStyle(el);
        for (const p of props) push(cs[p], weight);
      });
    } catch (e) {}
  };

  sample('header, nav', 6, ['backgroundColor', 'color', 'borderBottomColor']);
  sample('button, [class*="btn"], [class*="cta"], a[class*="button"]', 8,
         ['backgroundColor', 'color', 'borderColor']);
  sample('[class*="badge"], [class*="tag"], [class*="pill"]', 4,
         ['backgroundColor', 'color']);
  sample('[class*="hero"] h1, [class*="hero"] h2, [class*="banner"] h1', 5, ['color']);

  // Detectable gradient stops on prominent containers.
  try {
    let scanned = 0;
    for (const el of document.querySelectorAll('header, [class*="hero"], [class*="banner"], section')) {
      if (scanned++ > 40) break;
      const bg = window.getComputedStyle(el).backgroundImage || '';
      if (bg.indexOf('gradient') === -1) continue;
      const stops = bg.match(/rgba?\([^)]+\)|#[0-9a-fA-F]{3,8}/g);
      if (stops) stops.slice(0, 4).forEach(v => push(v, 3));
    }
  } catch (e) {}

  return votes.slice(0, 200);
})()
"##;

const TYPOGRAPHY_JS: &str = r##"
(() => {
  const tally = sel => {
    const counts = {};
    try {
      document.querySelectorAll(sel).forEach((el, i) => {
        if (i >= 40) return;
        const fam = window.getComputedStyle(el).fontFamily || '';
        const first = fam.split(',')[0].trim().replace(/^["']+|["']+$/g, '');
        if (first) counts[first] = (counts[first] || 0) + 1;
      });
    } catch (e) {}
    return counts;
  };
  return {
    headings: tally('h1, h2, h3'),
    body: tally('p, body, main, article, section')
  };
})()
"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_extractor_has_a_script() {
        for id in [
            ExtractorId::Content,
            ExtractorId::Images,
            ExtractorId::UiColors,
            ExtractorId::Typography,
        ] {
            let js = script_for(id);
            assert!(js.contains("(() => {"), "{} is not an expression", id.name());
            assert!(js.trim_end().ends_with("})()"));
        }
    }
}
