#[cfg(test)]
pub const POST_TAG_LINE: &str = "#smash #nintendo #switch #gaming

# Smash 5 Wishlist

Things I want to see in the next Smash.
";

#[cfg(test)]
pub const POST_KEYED_HEADER: &str = "<!--
[ID]: # (a63bd715-a3fe-4788-b0e1-2a3153778544)
[DATE]: # (2022-04-02 12:05:00.000)
[AUTHOR]: # (thiago)
[TAGS]: # (rust career)
-->

# What I learned after 20+ years of software development
How to be a great software engineer?

<!-- more -->

## Non technical
";

#[cfg(test)]
pub const POST_YAML_HEADER: &str = "<!--
tags: ['#BigChungus', '#memes']
-->

# Title of My Blog Post

Body of the post.
";

#[cfg(test)]
pub const POST_YAML_WITH_TITLE: &str = "<!--
title: Title of My Blog Post
author: devin
tags:
  - '#BigChungus'
  - memes
-->

# A heading that is not the title
";

#[cfg(test)]
pub fn tagged_post(title: &str, tags: &str) -> String {
    format!("{}\n\n# {}\n\nSome content.\n", tags, title)
}
